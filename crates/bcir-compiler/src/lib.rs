//! Bytecode IR and assembler.
//!
//! The front end describes each function body as a [`BcIr`]: a flat list of
//! instructions that refer to temporaries and jump targets symbolically. This
//! crate lowers it to [`BcCode`] in one forward pass, assigning frame slots
//! and patching branch addresses, and offers peephole recognizers for call
//! site specialization.
//!
//! ## Modules
//!
//! - [`bytecode`]: Final code types (Opcode, BcCode, ConstantPool)
//! - [`emit`]: Lowering context, slot frame and jump resolution
//! - [`ir`]: IR instructions, slots, labels and the `BcIr` builder

pub mod bytecode;
pub mod emit;
pub mod ir;

pub use bytecode::{BcCode, ConstantPool, DecodedInstr, JumpCond, Opcode, SlotKind, SlotOperand};
pub use emit::WriteOptions;
pub use ir::{AnyLocal, BcIr, BcIrInstr, BcIrOperand, BcIrSlot, JumpLabel, LazyLocal, Local};

// Re-export core types for convenience
pub use bcir_core::{LocOffset, LoweringError, Value, WriteError};
