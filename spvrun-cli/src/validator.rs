//! External-tool validator adapter.
//!
//! Spawns a configured command with the module path. A zero exit status
//! means the module is valid; otherwise the first stderr line of the shape
//! `error: <index>: <message>` pins the rejection to an instruction. Output
//! that does not parse degrades to index 0 with the raw text, so the
//! harness still fails with the validator's words.

use spvrun_runner::{ModuleValidator, ValidationOutcome, ValidatorError};
use std::path::PathBuf;
use std::process::Command;

pub struct ToolValidator {
    command: String,
    module_path: PathBuf,
}

impl ToolValidator {
    pub fn new(command: String, module_path: PathBuf) -> Self {
        Self {
            command,
            module_path,
        }
    }
}

impl ModuleValidator for ToolValidator {
    fn validate(&self, _module: &[u8]) -> Result<ValidationOutcome, ValidatorError> {
        let output = Command::new(&self.command)
            .arg(&self.module_path)
            .output()?;

        if output.status.success() {
            return Ok(ValidationOutcome::Valid);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(parse_rejection(&stderr))
    }
}

fn parse_rejection(stderr: &str) -> ValidationOutcome {
    for line in stderr.lines() {
        if let Some(rest) = line.strip_prefix("error: ") {
            if let Some((index, message)) = rest.split_once(": ") {
                if let Ok(index) = index.trim().parse::<usize>() {
                    return ValidationOutcome::Invalid {
                        index,
                        message: message.trim().to_string(),
                    };
                }
            }
        }
    }
    ValidationOutcome::Invalid {
        index: 0,
        message: stderr.trim().to_string(),
    }
}
