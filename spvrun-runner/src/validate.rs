//! # Validator Seam
//!
//! The external module validator is a black box: it either accepts the
//! module or reports the index of the offending instruction plus a message.
//! The harness correlates that index back to source context and treats any
//! rejection as fatal.

use thiserror::Error;

/// What the validator said about the module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid {
        /// Zero-based instruction index of the rejection.
        index: usize,
        message: String,
    },
}

/// Failures of the validator itself, as opposed to verdicts about the module.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to invoke validator: {0}")]
    Io(#[from] std::io::Error),

    #[error("validator produced unusable output: {0}")]
    Output(String),
}

/// The validator capability.
pub trait ModuleValidator {
    fn validate(&self, module: &[u8]) -> Result<ValidationOutcome, ValidatorError>;
}

/// Accepts every module. Used when no external validator is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullValidator;

impl ModuleValidator for NullValidator {
    fn validate(&self, _module: &[u8]) -> Result<ValidationOutcome, ValidatorError> {
        Ok(ValidationOutcome::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_validator_accepts_anything() {
        assert_eq!(
            NullValidator.validate(&[0xFF; 3]).unwrap(),
            ValidationOutcome::Valid
        );
    }
}
