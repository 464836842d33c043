//! Fatal harness errors
//!
//! Everything here ends the run; per-test failures are classified in
//! [`crate::report::TestOutcome`] instead and never surface as errors.

use crate::validate::ValidatorError;
use spvrun_device::{ApiError, BuildError, SelectError};
use spvrun_module::ModuleError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error("module validation failed:\n{diagnostic}")]
    Validation { diagnostic: String },

    #[error("validator error: {0}")]
    Validator(#[from] ValidatorError),

    #[error("device selection failed: {0}")]
    Select(#[from] SelectError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("compute API error: {0}")]
    Api(#[from] ApiError),
}
