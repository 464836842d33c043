//! # Diagnostic Correlator
//!
//! When the external validator rejects a module at instruction index *i*,
//! the raw index means nothing to a human. Correlation walks the
//! instruction stream twice to recover the source context:
//!
//! 1. a fold up to index *i* tracking the latest enclosing `OpFunction`
//!    result id and the latest `OpLine` source marker
//! 2. a fresh fold resolving those ids symbolically: the function's
//!    `OpName` and the file's `OpString` path
//!
//! Both folds are pure passes over restartable scans; no iterator state is
//! shared between them. Resolution is best effort: scan errors and missing
//! debug info degrade to a partial diagnostic, never to a failure.

use crate::module::Module;
use crate::scan::op;
use std::fmt;

/// Source position as tracked by `OpLine`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SourceMarker {
    file_id: u32,
    line: u32,
    column: u32,
}

/// Tracker state as of the failing instruction.
#[derive(Clone, Copy, Debug, Default)]
struct PositionState {
    function_id: Option<u32>,
    marker: Option<SourceMarker>,
}

/// Best-effort resolved source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// File path, when the file id resolved to an `OpString`.
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// Best-effort resolved enclosing function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedFunction {
    pub id: u32,
    /// Display name, when an `OpName` targets the function.
    pub name: Option<String>,
}

/// A validator failure correlated back to source context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Validator-reported instruction index.
    pub index: usize,
    pub message: String,
    /// Absent when no `OpLine` preceded the failing instruction.
    pub location: Option<ResolvedLocation>,
    /// Absent when no `OpFunction` preceded the failing instruction.
    pub function: Option<ResolvedFunction>,
}

/// Correlate a validator-reported instruction index and message against the
/// module's debug instructions.
pub fn correlate(module: &Module, index: usize, message: &str) -> Diagnostic {
    let state = position_at(module, index);
    let (function_name, file_path) = resolve_symbols(
        module,
        state.function_id,
        state.marker.map(|m| m.file_id),
    );

    Diagnostic {
        index,
        message: message.to_string(),
        location: state.marker.map(|m| ResolvedLocation {
            file: file_path,
            line: m.line,
            column: m.column,
        }),
        function: state.function_id.map(|id| ResolvedFunction {
            id,
            name: function_name,
        }),
    }
}

/// First pass: fold the stream up to (excluding) sequence index `index`,
/// keeping the most recent function definition and source marker.
fn position_at(module: &Module, index: usize) -> PositionState {
    module
        .instructions()
        .map_while(|result| result.ok())
        .take_while(|instruction| instruction.index < index)
        .fold(PositionState::default(), |mut state, instruction| {
            match instruction.opcode {
                // OpFunction: [result type, result id, control, type]
                op::FUNCTION if instruction.operands.len() >= 2 => {
                    state.function_id = Some(instruction.operands[1]);
                }
                // OpLine: [file id, line, column]
                op::LINE if instruction.operands.len() >= 3 => {
                    state.marker = Some(SourceMarker {
                        file_id: instruction.operands[0],
                        line: instruction.operands[1],
                        column: instruction.operands[2],
                    });
                }
                _ => {}
            }
            state
        })
}

/// Second pass: resolve the function's debug name and the file's path.
fn resolve_symbols(
    module: &Module,
    function_id: Option<u32>,
    file_id: Option<u32>,
) -> (Option<String>, Option<String>) {
    let mut function_name = None;
    let mut file_path = None;

    for instruction in module.instructions().map_while(|result| result.ok()) {
        match instruction.opcode {
            // OpName: [target id, name...]
            op::NAME if !instruction.operands.is_empty() => {
                if function_name.is_none() && Some(instruction.operands[0]) == function_id {
                    function_name = Some(instruction.literal_string(1));
                }
            }
            // OpString: [result id, string...]
            op::STRING if !instruction.operands.is_empty() => {
                if file_path.is_none() && Some(instruction.operands[0]) == file_id {
                    file_path = Some(instruction.literal_string(1));
                }
            }
            _ => {}
        }
        if (function_name.is_some() || function_id.is_none())
            && (file_path.is_some() || file_id.is_none())
        {
            break;
        }
    }

    (function_name, file_path)
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(location) = &self.location {
            let file = location.file.as_deref().unwrap_or("<unknown>");
            write!(f, "\n    at {}:{}:{}", file, location.line, location.column)?;
        }
        if let Some(function) = &self.function {
            let name = function.name.as_deref().unwrap_or("<unknown>");
            write!(f, "\n    in function %{} ({})", function.id, name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::MAGIC;

    fn literal_words(s: &str) -> Vec<u32> {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    fn instruction_words(opcode: u16, operands: &[u32]) -> Vec<u32> {
        let mut words = vec![((operands.len() as u32 + 1) << 16) | opcode as u32];
        words.extend_from_slice(operands);
        words
    }

    fn module_with(instruction_stream: &[Vec<u32>]) -> Module {
        let mut words = vec![MAGIC, 0x0001_0600, 0, 100, 0];
        for instruction in instruction_stream {
            words.extend_from_slice(instruction);
        }
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        Module::from_bytes(&bytes).unwrap()
    }

    fn debug_name(target: u32, name: &str) -> Vec<u32> {
        let mut operands = vec![target];
        operands.extend(literal_words(name));
        instruction_words(op::NAME, &operands)
    }

    fn debug_string(id: u32, text: &str) -> Vec<u32> {
        let mut operands = vec![id];
        operands.extend(literal_words(text));
        instruction_words(op::STRING, &operands)
    }

    fn line(file: u32, line: u32, column: u32) -> Vec<u32> {
        instruction_words(op::LINE, &[file, line, column])
    }

    fn function(id: u32) -> Vec<u32> {
        instruction_words(op::FUNCTION, &[2, id, 0, 3])
    }

    fn opaque(opcode: u16) -> Vec<u32> {
        instruction_words(opcode, &[])
    }

    #[test]
    fn test_fully_resolved_diagnostic() {
        let module = module_with(&[
            debug_string(9, "src/case.zig"), // 0
            debug_name(5, "case.doesMath"),  // 1
            function(5),                     // 2
            line(9, 42, 7),                  // 3
            opaque(1000),                    // 4 <- failure here
        ]);
        let diagnostic = correlate(&module, 4, "invalid result type");

        assert_eq!(
            diagnostic.location,
            Some(ResolvedLocation {
                file: Some("src/case.zig".into()),
                line: 42,
                column: 7,
            })
        );
        assert_eq!(
            diagnostic.function,
            Some(ResolvedFunction {
                id: 5,
                name: Some("case.doesMath".into()),
            })
        );
        assert_eq!(
            diagnostic.to_string(),
            "invalid result type\n    at src/case.zig:42:7\n    in function %5 (case.doesMath)"
        );
    }

    #[test]
    fn test_state_is_as_of_the_failing_index() {
        let module = module_with(&[
            function(5),    // 0
            line(9, 1, 1),  // 1
            opaque(1000),   // 2 <- failure here
            function(6),    // 3, after the failure: must not count
            line(9, 99, 9), // 4
        ]);
        let diagnostic = correlate(&module, 2, "boom");

        assert_eq!(diagnostic.function.as_ref().unwrap().id, 5);
        assert_eq!(diagnostic.location.as_ref().unwrap().line, 1);
    }

    #[test]
    fn test_latest_marker_wins() {
        let module = module_with(&[
            line(9, 1, 1),  // 0
            line(9, 20, 3), // 1
            opaque(1000),   // 2 <- failure here
        ]);
        let diagnostic = correlate(&module, 2, "boom");
        assert_eq!(diagnostic.location.as_ref().unwrap().line, 20);
    }

    #[test]
    fn test_unresolved_file_renders_unknown() {
        let module = module_with(&[line(9, 3, 4), opaque(1000)]);
        let diagnostic = correlate(&module, 1, "boom");
        assert_eq!(diagnostic.to_string(), "boom\n    at <unknown>:3:4");
    }

    #[test]
    fn test_unnamed_function_renders_unknown() {
        let module = module_with(&[function(5), opaque(1000)]);
        let diagnostic = correlate(&module, 1, "boom");
        assert_eq!(diagnostic.to_string(), "boom\n    in function %5 (<unknown>)");
    }

    #[test]
    fn test_nothing_found_suppresses_lines() {
        let module = module_with(&[opaque(1000)]);
        let diagnostic = correlate(&module, 0, "boom");
        assert_eq!(diagnostic.to_string(), "boom");
    }

    #[test]
    fn test_symbols_resolved_even_when_declared_late() {
        // OpName/OpString after the failing index still resolve: the second
        // pass covers the whole stream.
        let module = module_with(&[
            function(5),  // 0
            line(9, 2, 2), // 1
            opaque(1000), // 2 <- failure here
            debug_name(5, "late.name"),
            debug_string(9, "late.zig"),
        ]);
        let diagnostic = correlate(&module, 2, "boom");
        assert_eq!(diagnostic.function.as_ref().unwrap().name.as_deref(), Some("late.name"));
        assert_eq!(diagnostic.location.as_ref().unwrap().file.as_deref(), Some("late.zig"));
    }

    #[test]
    fn test_scan_error_degrades_to_partial_diagnostic() {
        let mut stream = vec![function(5), line(9, 2, 2)];
        stream.push(vec![7u32]); // word count 0: poisons the scan
        let module = module_with(&stream);
        let diagnostic = correlate(&module, 10, "boom");
        // the fold stops at the poison point but keeps what it saw
        assert_eq!(diagnostic.function.as_ref().unwrap().id, 5);
        assert_eq!(diagnostic.location.as_ref().unwrap().line, 2);
    }
}
