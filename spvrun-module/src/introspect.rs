//! # Module Introspector
//!
//! A single pass over the instruction stream collecting what the harness
//! needs to run a module's tests:
//!
//! - entry-point declarations (`OpEntryPoint`): id and display name
//! - initializer tags (`OpExecutionMode` with the Initializer mode): these
//!   entry points run implicitly and are excluded from direct invocation
//! - the embedded symbolic error-name table, carried as one
//!   `OpSourceExtension` literal with a fixed prefix, colon-delimited and
//!   percent-escaped

use crate::error::Result;
use crate::module::Module;
use crate::scan::{decode_literal_string, op, EXECUTION_MODE_INITIALIZER};

/// Prefix of the source-extension literal carrying the error-name table.
pub const ERROR_TABLE_PREFIX: &str = "zig_errors";

/// Symbolic error name whose code classifies a test as skipped.
pub const SKIP_NAME: &str = "SkipZigTest";

/// One invocable entry point declared by the module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub id: u32,
    pub name: String,
}

/// Everything the introspector extracts from one module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Introspection {
    /// Invocable entry points, in declaration order, initializers removed.
    pub entry_points: Vec<EntryPoint>,
    /// Decoded error-name table; empty when the module carries no marker.
    pub error_names: Vec<String>,
}

/// Introspection knobs.
#[derive(Clone, Copy, Debug)]
pub struct IntrospectOptions {
    /// Rewrite `.` in entry-point display names to `_` before kernel lookup.
    /// Some platforms reject kernel names containing the scope separator;
    /// the rewrite is purely cosmetic and can be turned off.
    pub rewrite_names: bool,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            rewrite_names: true,
        }
    }
}

/// Scan the module and collect its entry points and error-name table.
pub fn introspect(module: &Module, options: &IntrospectOptions) -> Result<Introspection> {
    let mut entry_points: Vec<EntryPoint> = Vec::new();
    let mut initializers: Vec<u32> = Vec::new();
    let mut error_names: Option<Vec<String>> = None;

    for instruction in module.instructions() {
        let instruction = instruction?;
        match instruction.opcode {
            // OpEntryPoint: [execution model, id, name..., interface ids...]
            op::ENTRY_POINT if instruction.operands.len() >= 3 => {
                let id = instruction.operands[1];
                let mut name = instruction.literal_string(2);
                if options.rewrite_names {
                    name = name.replace('.', "_");
                }
                // Colliding ids overwrite in place; the toolchain keeps ids
                // unique in practice, so this is tolerance, not policy.
                match entry_points.iter_mut().find(|ep| ep.id == id) {
                    Some(existing) => existing.name = name,
                    None => entry_points.push(EntryPoint { id, name }),
                }
            }
            // OpExecutionMode: [entry point id, mode, extra...]
            op::EXECUTION_MODE if instruction.operands.len() >= 2 => {
                if instruction.operands[1] == EXECUTION_MODE_INITIALIZER {
                    initializers.push(instruction.operands[0]);
                }
            }
            // First marker wins; later ones are silently ignored.
            op::SOURCE_EXTENSION if error_names.is_none() => {
                let text = decode_literal_string(instruction.operands);
                if let Some(suffix) = text.strip_prefix(ERROR_TABLE_PREFIX) {
                    error_names = Some(decode_error_table(suffix));
                }
            }
            _ => {}
        }
    }

    entry_points.retain(|ep| !initializers.contains(&ep.id));

    let error_names = match error_names {
        Some(names) => names,
        None => {
            tracing::warn!(
                "module carries no `{ERROR_TABLE_PREFIX}` marker; \
                 it may not originate from the expected toolchain"
            );
            Vec::new()
        }
    };

    Ok(Introspection {
        entry_points,
        error_names,
    })
}

/// Decode the table suffix: a leading `:` then colon-separated,
/// percent-escaped fields. An empty suffix is an empty table.
fn decode_error_table(suffix: &str) -> Vec<String> {
    match suffix.strip_prefix(':') {
        Some(fields) => fields.split(':').map(percent_decode).collect(),
        None => Vec::new(),
    }
}

/// Undo percent-escaping: `%XX` (hex) becomes the raw byte, everything else
/// passes through. Malformed escapes are kept literally.
pub fn percent_decode(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    (byte as char).to_digit(16).map(|v| v as u8)
}

/// Percent-escape a name so it can live in a colon-delimited field: the
/// delimiter, the escape character itself, and non-printable or non-ASCII
/// bytes become `%XX`.
pub fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        match byte {
            b':' | b'%' => out.push_str(&format!("%{byte:02X}")),
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
