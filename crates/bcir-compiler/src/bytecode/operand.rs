//! Slot operand encoding.
//!
//! A slot operand is a single word: the high 4 bits select the slot kind and
//! the low 28 bits hold the index within that kind.

use std::fmt;

use bcir_core::LoweringError;

const KIND_SHIFT: u32 = 28;
const INDEX_MASK: u32 = (1 << KIND_SHIFT) - 1;

/// Largest index representable in an operand word.
pub const MAX_OPERAND_INDEX: u32 = INDEX_MASK;

/// Storage class of an encoded slot operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SlotKind {
    /// Frame local (parameters, declared locals, temporaries).
    Local = 0,
    /// Constant pool entry.
    Const = 1,
    /// Module global.
    Global = 2,
    /// Cell of a captured local.
    Cell = 3,
    /// Free variable of a closure.
    Free = 4,
}

impl SlotKind {
    fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            0 => Some(SlotKind::Local),
            1 => Some(SlotKind::Const),
            2 => Some(SlotKind::Global),
            3 => Some(SlotKind::Cell),
            4 => Some(SlotKind::Free),
            _ => None,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            SlotKind::Local => "L",
            SlotKind::Const => "C",
            SlotKind::Global => "G",
            SlotKind::Cell => "CELL",
            SlotKind::Free => "FREE",
        }
    }
}

/// A decoded slot operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotOperand {
    /// Storage class.
    pub kind: SlotKind,
    /// Index within the storage class.
    pub index: u32,
}

impl SlotOperand {
    /// Create an operand, failing if the index does not fit the encoding.
    pub fn new(kind: SlotKind, index: u32) -> Result<Self, LoweringError> {
        if index > MAX_OPERAND_INDEX {
            return Err(LoweringError::OperandOverflow { index });
        }
        Ok(Self { kind, index })
    }

    /// Encode into an operand word.
    pub fn encode(&self) -> u32 {
        ((self.kind as u32) << KIND_SHIFT) | self.index
    }

    /// Decode an operand word, returning None for an unknown kind tag.
    pub fn decode(word: u32) -> Option<Self> {
        SlotKind::from_tag(word >> KIND_SHIFT).map(|kind| Self {
            kind,
            index: word & INDEX_MASK,
        })
    }
}

impl fmt::Display for SlotOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.index)
    }
}
