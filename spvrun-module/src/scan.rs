//! # Instruction Scanner
//!
//! Lazy, restartable decoding of the flat word stream into variable-length
//! instructions. Every instruction's first word packs its declared word
//! count (high 16 bits) and opcode (low 16 bits); the scanner advances by
//! declared length alone and interprets no semantics.
//!
//! A declared word count of zero can never advance the cursor, so it is an
//! unrecoverable input error rather than something to skip past.

use crate::error::ModuleError;

/// Opcode constants for the instructions the harness actually consumes.
/// Everything else is skipped structurally by word count.
pub mod op {
    pub const SOURCE_EXTENSION: u16 = 4;
    pub const NAME: u16 = 5;
    pub const STRING: u16 = 7;
    pub const LINE: u16 = 8;
    pub const ENTRY_POINT: u16 = 15;
    pub const EXECUTION_MODE: u16 = 16;
    pub const FUNCTION: u16 = 54;
}

/// Execution-mode operand marking an entry point as an implicit initializer.
pub const EXECUTION_MODE_INITIALIZER: u32 = 33;

/// A borrowed view of one instruction in the module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction<'a> {
    /// Opcode, from the low 16 bits of the first word.
    pub opcode: u16,
    /// Declared total word count, including the first word. Always >= 1.
    pub word_count: u16,
    /// Zero-based position in the instruction sequence.
    pub index: usize,
    /// Word offset of the first word within the module.
    pub offset: usize,
    /// Operand words (everything after the first word).
    pub operands: &'a [u32],
}

impl Instruction<'_> {
    /// Decode a NUL-terminated literal string starting at operand word `from`.
    pub fn literal_string(&self, from: usize) -> String {
        decode_literal_string(&self.operands[from..])
    }
}

/// Decode a SPIR-V literal string: UTF-8 bytes packed little-endian four per
/// word, NUL-terminated. Invalid UTF-8 decodes lossily.
pub fn decode_literal_string(words: &[u32]) -> String {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    'words: for word in words {
        for byte in word.to_le_bytes() {
            if byte == 0 {
                break 'words;
            }
            bytes.push(byte);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Iterator over the instruction stream.
///
/// Yields at most one `Err`: a zero word count or an overrunning declared
/// length poisons the scan, after which the iterator is fused.
#[derive(Clone, Debug)]
pub struct Instructions<'a> {
    words: &'a [u32],
    offset: usize,
    index: usize,
    poisoned: bool,
}

impl<'a> Instructions<'a> {
    pub(crate) fn new(words: &'a [u32], start: usize) -> Self {
        Self {
            words,
            offset: start,
            index: 0,
            poisoned: false,
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ModuleError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned || self.offset >= self.words.len() {
            return None;
        }

        let first = self.words[self.offset];
        let opcode = (first & 0xFFFF) as u16;
        let word_count = (first >> 16) as u16;

        if word_count == 0 {
            self.poisoned = true;
            return Some(Err(ModuleError::ZeroWordCount {
                offset: self.offset,
            }));
        }

        let end = self.offset + word_count as usize;
        if end > self.words.len() {
            self.poisoned = true;
            return Some(Err(ModuleError::TruncatedInstruction {
                offset: self.offset,
            }));
        }

        let instruction = Instruction {
            opcode,
            word_count,
            index: self.index,
            offset: self.offset,
            operands: &self.words[self.offset + 1..end],
        };
        self.offset = end;
        self.index += 1;
        Some(Ok(instruction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, HEADER_WORDS, MAGIC};
    use proptest::prelude::*;

    fn first_word(opcode: u16, word_count: u16) -> u32 {
        (word_count as u32) << 16 | opcode as u32
    }

    fn module_with(words: &[u32]) -> Module {
        let mut all = vec![MAGIC, 0x0001_0600, 0, 100, 0];
        all.extend_from_slice(words);
        let bytes: Vec<u8> = all.iter().flat_map(|w| w.to_le_bytes()).collect();
        Module::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_scan_yields_declared_instructions_in_order() {
        let module = module_with(&[
            first_word(op::NAME, 3),
            7,
            0x0074_0073, // "st"
            first_word(op::LINE, 4),
            1,
            10,
            5,
            first_word(999, 1),
        ]);

        let decoded: Vec<_> = module
            .instructions()
            .collect::<Result<_, _>>()
            .expect("clean module scans");

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].opcode, op::NAME);
        assert_eq!(decoded[0].index, 0);
        assert_eq!(decoded[0].offset, HEADER_WORDS);
        assert_eq!(decoded[0].operands, &[7, 0x0074_0073]);
        assert_eq!(decoded[1].opcode, op::LINE);
        assert_eq!(decoded[1].operands, &[1, 10, 5]);
        assert_eq!(decoded[2].opcode, 999);
        assert!(decoded[2].operands.is_empty());
    }

    #[test]
    fn test_scan_is_restartable() {
        let module = module_with(&[first_word(42, 1), first_word(43, 1)]);
        assert_eq!(module.instructions().count(), 2);
        assert_eq!(module.instructions().count(), 2);
    }

    #[test]
    fn test_zero_word_count_is_fatal_and_fuses() {
        let module = module_with(&[first_word(42, 1), first_word(7, 0), first_word(43, 1)]);
        let mut scan = module.instructions();
        assert!(scan.next().unwrap().is_ok());
        assert!(matches!(
            scan.next(),
            Some(Err(ModuleError::ZeroWordCount { offset: 6 }))
        ));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_overrunning_word_count_is_fatal() {
        let module = module_with(&[first_word(42, 9)]);
        let mut scan = module.instructions();
        assert!(matches!(
            scan.next(),
            Some(Err(ModuleError::TruncatedInstruction { offset: 5 }))
        ));
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_literal_string_decoding() {
        // "abcd" then "e" then NUL padding
        assert_eq!(decode_literal_string(&[0x6463_6261, 0x0000_0065]), "abcde");
        // NUL in the first byte: empty string
        assert_eq!(decode_literal_string(&[0x6161_6100]), "");
        assert_eq!(decode_literal_string(&[]), "");
    }

    proptest! {
        /// The scanner traverses exactly the declared word counts: summing
        /// them over a clean scan accounts for every word past the header.
        #[test]
        fn prop_word_count_accounting(counts in proptest::collection::vec(1u16..8, 0..32)) {
            let mut words = Vec::new();
            for &count in &counts {
                words.push(first_word(1000, count));
                words.extend(std::iter::repeat(0xABCD_0123).take(count as usize - 1));
            }
            let module = module_with(&words);

            let mut total = 0usize;
            let mut seen = 0usize;
            for instruction in module.instructions() {
                let instruction = instruction.unwrap();
                prop_assert_eq!(instruction.word_count, counts[seen]);
                total += instruction.word_count as usize;
                seen += 1;
            }
            prop_assert_eq!(seen, counts.len());
            prop_assert_eq!(total, module.len_words() - HEADER_WORDS);
        }
    }
}
