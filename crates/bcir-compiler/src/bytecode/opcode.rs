//! Bytecode operation codes.
//!
//! This module defines the instruction set of the finalized bytecode.
//! Each instruction is an opcode word followed by a fixed number of operand
//! words. Operands are either encoded slots (see [`super::operand`]) or
//! absolute word addresses.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The interpreter is a register machine over frame slots: operands name
/// slots (locals, constants, globals, cells, free variables) and results are
/// written to a destination local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u32)]
pub enum Opcode {
    // =========================================================================
    // Moves
    // =========================================================================
    /// Copy a slot into a local.
    /// Operands: src slot, dst local
    Cp = 0,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Unconditional jump.
    /// Operands: target address
    Br,
    /// Jump if the condition is truthy.
    /// Operands: cond local, target address
    IfBr,
    /// Jump if the condition is falsy.
    /// Operands: cond local, target address
    IfNotBr,
    /// Start iterating a collection; jumps to the end address when empty.
    /// Operands: collection slot, item local, end address
    ForInit,
    /// Fetch the next item and jump back to the loop body, or fall through.
    /// Operands: item local, body address
    Continue,
    /// Return a value.
    /// Operands: value slot
    Return,
    /// Return `None`.
    ReturnNone,

    // =========================================================================
    // Type Tests
    // =========================================================================
    /// `type(expr) == T`.
    /// Operands: expr slot, type name constant, dst local
    TypeIs,

    // =========================================================================
    // Arithmetic and Comparison
    // =========================================================================
    /// `a + b`. Operands: a, b, dst
    Plus,
    /// `a - b`. Operands: a, b, dst
    Minus,
    /// `a * b`. Operands: a, b, dst
    Mul,
    /// `a / b`. Operands: a, b, dst
    Div,
    /// `a % b`. Operands: a, b, dst
    Mod,
    /// `-a`. Operands: a, dst
    Neg,
    /// `not a`. Operands: a, dst
    Not,
    /// `a == b`. Operands: a, b, dst
    Eq,
    /// `a != b`. Operands: a, b, dst
    NotEq,
    /// `a < b`. Operands: a, b, dst
    Lt,
    /// `a <= b`. Operands: a, b, dst
    LtEq,
    /// `a in b`. Operands: a, b, dst
    In,

    // =========================================================================
    // Objects and Calls
    // =========================================================================
    /// `obj[key]`. Operands: obj, key, dst
    Index,
    /// `obj[key] = value`. Operands: obj, key, value
    SetIndex,
    /// `obj.name`. Operands: obj, name constant, dst
    GetAttr,
    /// `callee(*args)`. Operands: callee, args tuple, dst
    Call,
}

impl Opcode {
    /// Convert from an instruction word, returning None for invalid values.
    pub fn from_word(word: u32) -> Option<Self> {
        Opcode::try_from(word).ok()
    }

    /// Number of operand words following the opcode word.
    pub fn operand_count(&self) -> usize {
        match self {
            Opcode::ReturnNone => 0,
            Opcode::Br | Opcode::Return => 1,
            Opcode::Cp
            | Opcode::IfBr
            | Opcode::IfNotBr
            | Opcode::Continue
            | Opcode::Neg
            | Opcode::Not => 2,
            Opcode::ForInit
            | Opcode::TypeIs
            | Opcode::Plus
            | Opcode::Minus
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Eq
            | Opcode::NotEq
            | Opcode::Lt
            | Opcode::LtEq
            | Opcode::In
            | Opcode::Index
            | Opcode::SetIndex
            | Opcode::GetAttr
            | Opcode::Call => 3,
        }
    }

    /// Total words occupied by an instruction with this opcode.
    pub fn width(&self) -> usize {
        1 + self.operand_count()
    }

    /// Positions (within the operands) holding absolute addresses.
    pub fn address_operands(&self) -> &'static [usize] {
        match self {
            Opcode::Br => &[0],
            Opcode::IfBr | Opcode::IfNotBr | Opcode::Continue => &[1],
            Opcode::ForInit => &[2],
            _ => &[],
        }
    }

    /// Whether the opcode carries addresses and can only be produced by
    /// structural IR instructions.
    pub fn is_reserved(&self) -> bool {
        !self.address_operands().is_empty()
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Cp => "CP",
            Opcode::Br => "BR",
            Opcode::IfBr => "IF_BR",
            Opcode::IfNotBr => "IF_NOT_BR",
            Opcode::ForInit => "FOR_INIT",
            Opcode::Continue => "CONTINUE",
            Opcode::Return => "RETURN",
            Opcode::ReturnNone => "RETURN_NONE",
            Opcode::TypeIs => "TYPE_IS",
            Opcode::Plus => "PLUS",
            Opcode::Minus => "MINUS",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Neg => "NEG",
            Opcode::Not => "NOT",
            Opcode::Eq => "EQ",
            Opcode::NotEq => "NOT_EQ",
            Opcode::Lt => "LT",
            Opcode::LtEq => "LT_EQ",
            Opcode::In => "IN",
            Opcode::Index => "INDEX",
            Opcode::SetIndex => "SET_INDEX",
            Opcode::GetAttr => "GET_ATTR",
            Opcode::Call => "CALL",
        }
    }
}

/// Condition tested by a conditional branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpCond {
    /// Jump when the condition is truthy.
    IfTrue,
    /// Jump when the condition is falsy.
    IfFalse,
}

impl JumpCond {
    /// The branch opcode implementing this condition.
    pub fn opcode(&self) -> Opcode {
        match self {
            JumpCond::IfTrue => Opcode::IfBr,
            JumpCond::IfFalse => Opcode::IfNotBr,
        }
    }
}
