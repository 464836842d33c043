//! # Module Container
//!
//! An immutable sequence of 32-bit little-endian words decoded from a raw
//! SPIR-V binary.
//!
//! Binary layout:
//! ```text
//! Word  Field
//! ─────────────────────
//! 0     magic (0x07230203)
//! 1     version
//! 2     generator
//! 3     bound
//! 4     schema (reserved)
//! 5..   instruction stream
//! ```

use crate::error::{ModuleError, Result};
use crate::scan::Instructions;

/// Magic number of a little-endian SPIR-V module.
pub const MAGIC: u32 = 0x0723_0203;

/// Header size in words (magic, version, generator, bound, schema).
pub const HEADER_WORDS: usize = 5;

/// A loaded module: the ordered word sequence of the binary under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    words: Vec<u32>,
}

impl Module {
    /// Decode a module from raw bytes.
    ///
    /// A first word equal to the byte-swapped magic means the module was
    /// produced on a foreign-endianness host; it is rejected, not repaired.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ModuleError::Empty);
        }
        if bytes.len() % 4 != 0 {
            return Err(ModuleError::UnalignedLength(bytes.len()));
        }

        let words: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        match words[0] {
            MAGIC => {}
            w if w == MAGIC.swap_bytes() => return Err(ModuleError::ForeignEndianness(w)),
            w => return Err(ModuleError::InvalidMagic(w)),
        }

        if words.len() < HEADER_WORDS {
            return Err(ModuleError::TruncatedHeader(words.len()));
        }

        Ok(Self { words })
    }

    /// The full word sequence, header included.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Module length in words.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Declared version word.
    pub fn version(&self) -> u32 {
        self.words[1]
    }

    /// Generator magic of the producing toolchain.
    pub fn generator(&self) -> u32 {
        self.words[2]
    }

    /// Id bound: all result ids are below this value.
    pub fn bound(&self) -> u32 {
        self.words[3]
    }

    /// A restartable scan over the instruction stream, starting past the header.
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.words, HEADER_WORDS)
    }
}
