//! Error types for module loading and scanning

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("module is empty")]
    Empty,

    #[error("module byte length {0} is not a multiple of 4")]
    UnalignedLength(usize),

    #[error("module magic is byte-swapped ({0:#010x}); foreign-endianness modules are rejected")]
    ForeignEndianness(u32),

    #[error("invalid module magic: expected 0x07230203, got {0:#010x}")]
    InvalidMagic(u32),

    #[error("module is shorter than the 5-word header ({0} words)")]
    TruncatedHeader(usize),

    #[error("instruction at word offset {offset} declares a word count of zero")]
    ZeroWordCount { offset: usize },

    #[error("instruction at word offset {offset} overruns the end of the module")]
    TruncatedInstruction { offset: usize },
}

pub type Result<T> = std::result::Result<T, ModuleError>;
