//! # SPIR-V Module Introspection
//!
//! Structural access to a compiled SPIR-V module for test discovery:
//!
//! - **Instruction scanning**: lazy decoding of the flat word stream into
//!   `(opcode, operands)` views, skipping unknown opcodes by declared length
//! - **Introspection**: entry-point names and ids, initializer exclusion,
//!   and the embedded symbolic error-name table
//! - **Diagnostic correlation**: mapping a validator-reported instruction
//!   index back to a source location and enclosing function
//!
//! No instruction semantics are interpreted beyond the handful of opcodes
//! the harness needs; this is deliberately not a full SPIR-V library.

pub mod diag;
pub mod error;
pub mod introspect;
pub mod module;
pub mod scan;

pub use diag::{correlate, Diagnostic, ResolvedFunction, ResolvedLocation};
pub use error::ModuleError;
pub use introspect::{
    introspect, percent_decode, percent_encode, EntryPoint, Introspection, IntrospectOptions,
    ERROR_TABLE_PREFIX, SKIP_NAME,
};
pub use module::{Module, HEADER_WORDS, MAGIC};
pub use scan::{Instruction, Instructions};
