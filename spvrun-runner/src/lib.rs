//! # Test Orchestrator
//!
//! Drives one conformance run end to end:
//!
//! ```text
//! Load -> Validate -> Introspect -> SelectDevice -> BuildProgram -> {RunEntry}* -> Report
//! ```
//!
//! Each surviving entry point executes as an isolated unit of work: a fresh
//! kernel, a shared one-word result buffer zeroed per launch, a single work
//! item, a blocking wait, then read-back and classification against the
//! module's symbolic error-name table. Execution is strictly sequential;
//! the harness does not assume a device tolerates concurrent independent
//! launches.

pub mod error;
pub mod report;
pub mod run;
pub mod validate;

pub use error::HarnessError;
pub use report::{Reporter, RunSummary, TestOutcome, TestResult};
pub use run::{run_harness, HarnessConfig};
pub use validate::{ModuleValidator, NullValidator, ValidationOutcome, ValidatorError};
