//! Finalized bytecode for one compilation unit.
//!
//! A `BcCode` is what lowering hands to the interpreter: a dense word stream
//! with every slot and jump target resolved, the constants it refers to, and
//! the frame size the interpreter must reserve.

use std::fmt;

use bcir_core::{LocOffset, Value};

use super::{ConstantPool, Opcode, SlotOperand};

/// Finalized, directly executable code.
#[derive(Debug, Clone, Default)]
pub struct BcCode {
    /// Instruction words.
    pub(crate) words: Vec<u32>,
    /// Position hints (parallel to `words`).
    pub(crate) locs: Vec<LocOffset>,
    /// Constants referenced by `Const` operands.
    pub(crate) constants: ConstantPool,
    /// Slots the interpreter must reserve for the frame.
    pub(crate) frame_size: u32,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstr<'a> {
    /// Word address of the opcode.
    pub offset: usize,
    /// The opcode.
    pub opcode: Opcode,
    /// Operand words.
    pub operands: &'a [u32],
}

impl DecodedInstr<'_> {
    /// Address operands of this instruction.
    pub fn addresses(&self) -> impl Iterator<Item = u32> + '_ {
        self.opcode
            .address_operands()
            .iter()
            .map(|&pos| self.operands[pos])
    }
}

impl BcCode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Write an opcode word.
    pub(crate) fn write_op(&mut self, op: Opcode, loc: LocOffset) {
        self.write_word(op.into(), loc);
    }

    /// Write an operand word.
    pub(crate) fn write_word(&mut self, word: u32, loc: LocOffset) {
        self.words.push(word);
        self.locs.push(loc);
    }

    /// Overwrite a previously reserved operand word.
    ///
    /// # Panics
    ///
    /// Panics if `offset` has not been written yet.
    pub(crate) fn patch_word(&mut self, offset: usize, word: u32) {
        assert!(
            offset < self.words.len(),
            "patch offset {} past end of code ({} words)",
            offset,
            self.words.len()
        );
        self.words[offset] = word;
    }

    /// Get current code offset (the address of the next word).
    pub fn current_offset(&self) -> usize {
        self.words.len()
    }

    /// Get the instruction words.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Get the position hints.
    pub fn locs(&self) -> &[LocOffset] {
        &self.locs
    }

    /// Get the position hint for a given offset.
    pub fn loc_at(&self, offset: usize) -> Option<LocOffset> {
        self.locs.get(offset).copied()
    }

    /// Get the constant pool.
    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    /// Get a constant by index.
    pub fn constant(&self, index: u32) -> Option<&Value> {
        self.constants.get(index)
    }

    /// Number of frame slots the interpreter must reserve.
    pub fn frame_size(&self) -> u32 {
        self.frame_size
    }

    /// Get the length of the code in words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if the code is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Read a word at the given offset.
    pub fn read_word(&self, offset: usize) -> Option<u32> {
        self.words.get(offset).copied()
    }

    /// Read an opcode at the given offset.
    pub fn read_op(&self, offset: usize) -> Option<Opcode> {
        self.read_word(offset).and_then(Opcode::from_word)
    }

    /// Decode the instruction starting at `offset`.
    pub fn decode_at(&self, offset: usize) -> Option<DecodedInstr<'_>> {
        let opcode = self.read_op(offset)?;
        let operands = self.words.get(offset + 1..offset + opcode.width())?;
        Some(DecodedInstr {
            offset,
            opcode,
            operands,
        })
    }

    /// Iterate over decoded instructions.
    ///
    /// Stops at the first word that does not decode.
    pub fn instructions(&self) -> impl Iterator<Item = DecodedInstr<'_>> + '_ {
        let mut offset = 0;
        std::iter::from_fn(move || {
            let instr = self.decode_at(offset)?;
            offset += instr.opcode.width();
            Some(instr)
        })
    }

    /// Extract all opcodes from the code, skipping operands.
    ///
    /// This is useful for testing instruction sequences without worrying about
    /// specific operand values or addresses.
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions().map(|instr| instr.opcode).collect()
    }

    /// Check if this code contains exactly the given opcode sequence.
    ///
    /// Panics with a descriptive message if the sequences don't match.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[Opcode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Check if this code contains the given opcodes (in order, but not necessarily contiguous).
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[Opcode]) {
        let actual = self.opcodes();
        let mut expected_iter = expected.iter().peekable();

        for op in &actual {
            if expected_iter.peek() == Some(&op) {
                expected_iter.next();
            }
        }

        if expected_iter.peek().is_some() {
            let remaining: Vec<_> = expected_iter.map(|op| op.name()).collect();
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                remaining,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

impl fmt::Display for BcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in self.instructions() {
            write!(f, "{:>4}: {}", instr.offset, instr.opcode.name())?;
            let addresses = instr.opcode.address_operands();
            for (pos, &word) in instr.operands.iter().enumerate() {
                if addresses.contains(&pos) {
                    write!(f, " @{word}")?;
                } else {
                    match SlotOperand::decode(word) {
                        Some(slot) => write!(f, " {slot}")?,
                        None => write!(f, " #{word:x}")?,
                    }
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
