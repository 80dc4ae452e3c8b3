//! IR instructions.
//!
//! [`BcIrInstr`] is the closed set of instructions the front end can emit.
//! Each variant knows how to write itself into the final code given a
//! [`WriteContext`], which turns symbolic slots and labels into frame indices
//! and addresses.

use std::fmt;

use bcir_core::{LocOffset, LoweringError, Value};

use super::{AnyLocal, BcIrSlot, JumpLabel, LazyLocal};
use crate::bytecode::{JumpCond, Opcode};
use crate::emit::WriteContext;

/// Operand of a generic [`BcIrInstr::Op`] instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BcIrOperand {
    /// Slot read by the instruction.
    In(BcIrSlot),
    /// Local written by the instruction.
    Out(AnyLocal),
    /// Raw immediate word.
    Imm(u32),
    /// Constant, written as a reference into the constant pool.
    Const(Value),
}

impl fmt::Display for BcIrOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcIrOperand::In(slot) => write!(f, "{slot}"),
            BcIrOperand::Out(local) => write!(f, "->{local}"),
            BcIrOperand::Imm(imm) => write!(f, "#{imm}"),
            BcIrOperand::Const(value) => write!(f, "{value}"),
        }
    }
}

/// An IR instruction.
///
/// Instructions never refer to absolute addresses or to frame indices of
/// symbolic locals, so sequences of them can be concatenated freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BcIrInstr {
    /// Copy a slot into a local.
    Cp {
        loc: LocOffset,
        src: BcIrSlot,
        dest: AnyLocal,
    },
    /// Bind a symbolic local to the next free frame slot.
    AllocSlot { local: LazyLocal },
    /// Return a symbolic local's frame slot.
    ReleaseSlot { local: LazyLocal },
    /// Unconditional forward jump.
    Br { loc: LocOffset, label: JumpLabel },
    /// Conditional forward jump.
    IfBr {
        loc: LocOffset,
        cond: AnyLocal,
        jump_cond: JumpCond,
        label: JumpLabel,
    },
    /// Make the current position the target of `label`.
    PlaceLabel { label: JumpLabel },
    /// `result = type(expr) == type_name`.
    TypeIs {
        loc: LocOffset,
        expr: BcIrSlot,
        type_name: String,
        result: AnyLocal,
    },
    /// Return a value.
    Return { loc: LocOffset, value: BcIrSlot },
    /// Start a `for` loop over `collection`, binding each element to `item`.
    ForInit {
        loc: LocOffset,
        collection: BcIrSlot,
        item: AnyLocal,
    },
    /// Close the innermost open `for` loop.
    ForClose { loc: LocOffset },
    /// Any other opcode, with operands resolved one by one.
    Op {
        loc: LocOffset,
        opcode: Opcode,
        operands: Vec<BcIrOperand>,
    },
}

impl BcIrInstr {
    /// Copy instruction.
    pub fn cp(loc: LocOffset, src: impl Into<BcIrSlot>, dest: impl Into<AnyLocal>) -> Self {
        BcIrInstr::Cp {
            loc,
            src: src.into(),
            dest: dest.into(),
        }
    }

    /// Return instruction.
    pub fn ret(loc: LocOffset, value: impl Into<BcIrSlot>) -> Self {
        BcIrInstr::Return {
            loc,
            value: value.into(),
        }
    }

    /// Type test instruction.
    pub fn type_is(
        loc: LocOffset,
        expr: impl Into<BcIrSlot>,
        type_name: impl Into<String>,
        result: impl Into<AnyLocal>,
    ) -> Self {
        BcIrInstr::TypeIs {
            loc,
            expr: expr.into(),
            type_name: type_name.into(),
            result: result.into(),
        }
    }

    /// Generic instruction.
    pub fn op(loc: LocOffset, opcode: Opcode, operands: Vec<BcIrOperand>) -> Self {
        BcIrInstr::Op {
            loc,
            opcode,
            operands,
        }
    }

    /// Write this instruction into the code being built by `ctx`.
    pub(crate) fn write(&self, ctx: &mut WriteContext) -> Result<(), LoweringError> {
        match self {
            BcIrInstr::Cp { loc, src, dest } => {
                ctx.begin(Opcode::Cp, *loc);
                ctx.write_slot(src)?;
                ctx.write_local(*dest)?;
                ctx.end()
            }
            BcIrInstr::AllocSlot { local } => ctx.alloc_slot(*local),
            BcIrInstr::ReleaseSlot { local } => ctx.release_slot(*local),
            BcIrInstr::Br { loc, label } => {
                ctx.begin(Opcode::Br, *loc);
                ctx.write_jump(*label)?;
                ctx.end()
            }
            BcIrInstr::IfBr {
                loc,
                cond,
                jump_cond,
                label,
            } => {
                ctx.begin(jump_cond.opcode(), *loc);
                ctx.write_local(*cond)?;
                ctx.write_jump(*label)?;
                ctx.end()
            }
            BcIrInstr::PlaceLabel { label } => ctx.place_label(*label),
            BcIrInstr::TypeIs {
                loc,
                expr,
                type_name,
                result,
            } => {
                ctx.begin(Opcode::TypeIs, *loc);
                ctx.write_slot(expr)?;
                ctx.write_const(Value::str(type_name.as_str()))?;
                ctx.write_local(*result)?;
                ctx.end()
            }
            BcIrInstr::Return { loc, value } => {
                ctx.begin(Opcode::Return, *loc);
                ctx.write_slot(value)?;
                ctx.end()
            }
            BcIrInstr::ForInit {
                loc,
                collection,
                item,
            } => ctx.for_init(*loc, collection, *item),
            BcIrInstr::ForClose { loc } => ctx.for_close(*loc),
            BcIrInstr::Op {
                loc,
                opcode,
                operands,
            } => {
                if opcode.is_reserved() {
                    return Err(LoweringError::ReservedOpcode {
                        opcode: opcode.name(),
                    });
                }
                if operands.len() != opcode.operand_count() {
                    return Err(LoweringError::OperandCountMismatch {
                        opcode: opcode.name(),
                        expected: opcode.operand_count(),
                        actual: operands.len(),
                    });
                }
                ctx.begin(*opcode, *loc);
                for operand in operands {
                    match operand {
                        BcIrOperand::In(slot) => ctx.write_slot(slot)?,
                        BcIrOperand::Out(local) => ctx.write_local(*local)?,
                        BcIrOperand::Imm(imm) => ctx.write_imm(*imm),
                        BcIrOperand::Const(value) => ctx.write_const(value.clone())?,
                    }
                }
                ctx.end()
            }
        }
    }
}

impl fmt::Display for BcIrInstr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcIrInstr::Cp { src, dest, .. } => write!(f, "Cp({src} -> {dest})"),
            BcIrInstr::AllocSlot { local } => write!(f, "AllocSlot({local})"),
            BcIrInstr::ReleaseSlot { local } => write!(f, "ReleaseSlot({local})"),
            BcIrInstr::Br { label, .. } => write!(f, "Br({label})"),
            BcIrInstr::IfBr {
                cond,
                jump_cond,
                label,
                ..
            } => write!(f, "IfBr({cond}, {jump_cond:?}, {label})"),
            BcIrInstr::PlaceLabel { label } => write!(f, "Label({label})"),
            BcIrInstr::TypeIs {
                expr,
                type_name,
                result,
                ..
            } => write!(f, "TypeIs({expr}, {type_name:?} -> {result})"),
            BcIrInstr::Return { value, .. } => write!(f, "Return({value})"),
            BcIrInstr::ForInit {
                collection, item, ..
            } => write!(f, "ForInit({collection} -> {item})"),
            BcIrInstr::ForClose { .. } => write!(f, "ForClose"),
            BcIrInstr::Op {
                opcode, operands, ..
            } => {
                write!(f, "{}(", opcode.name())?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                write!(f, ")")
            }
        }
    }
}
