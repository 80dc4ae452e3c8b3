//! Finalized bytecode types.
//!
//! This module contains the output side of lowering:
//!
//! - [`Opcode`] and [`JumpCond`] - The instruction set of the interpreter
//! - [`SlotOperand`] - Encoding of slot operands into words
//! - [`ConstantPool`] - Per-unit constant storage
//! - [`BcCode`] - Address-resolved code for one unit

mod code;
mod constant;
mod opcode;
mod operand;

pub use code::{BcCode, DecodedInstr};
pub use constant::ConstantPool;
pub use opcode::{JumpCond, Opcode};
pub use operand::{MAX_OPERAND_INDEX, SlotKind, SlotOperand};
