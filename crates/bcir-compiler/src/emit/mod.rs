//! Lowering of IR to finalized bytecode.
//!
//! The [`WriteContext`] is the state of one lowering pass. [`BcIr::write`]
//! creates it, asks every instruction to write itself against it in order,
//! and finally calls [`WriteContext::finish`] to patch jump addresses and
//! validate the result.
//!
//! # Example
//!
//! ```ignore
//! use bcir_compiler::emit::WriteOptions;
//!
//! let code = ir.write(WriteOptions::new(param_count))?;
//! interpreter.run(&code);
//! ```
//!
//! [`BcIr::write`]: crate::ir::BcIr::write

mod jumps;
mod slots;

use bcir_core::{LocOffset, LoweringError, Value};
use tracing::{trace, warn};

use crate::bytecode::{BcCode, Opcode, SlotKind, SlotOperand};
use crate::ir::{AnyLocal, BcIrSlot, JumpLabel, LazyLocal};
use jumps::{JumpResolver, LoopContext};
use slots::SlotFrame;

/// Placeholder written for addresses until they are patched.
const UNRESOLVED_ADDRESS: u32 = u32::MAX;

/// Options for lowering one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Frame slots occupied by parameters and declared locals.
    ///
    /// Resolved [`Local`](crate::ir::Local)s must index below this; symbolic
    /// locals are assigned slots starting here.
    pub fixed_locals: u32,
}

impl WriteOptions {
    /// Options for a unit with `fixed_locals` parameters and declared locals.
    pub fn new(fixed_locals: u32) -> Self {
        Self { fixed_locals }
    }
}

/// Instruction currently being written.
#[derive(Debug, Clone, Copy)]
struct Pending {
    opcode: Opcode,
    start: usize,
    loc: LocOffset,
}

/// Resolution state of one lowering pass.
///
/// Owns the code being built, the slot assignment and the jump bookkeeping.
/// Lives exactly as long as one [`BcIr::write`](crate::ir::BcIr::write) call.
#[derive(Debug)]
pub(crate) struct WriteContext {
    /// The code being built.
    code: BcCode,
    /// Frame slots of symbolic locals.
    slots: SlotFrame,
    /// Labels, branch fixups and open loops.
    jumps: JumpResolver,
    /// Slots before the first symbolic local.
    fixed_locals: u32,
    /// Instruction being written, between `begin` and `end`.
    current: Option<Pending>,
    /// Index of the IR instruction being written.
    instr_index: usize,
    /// Words accounted for by completed instructions.
    accounted_words: usize,
    /// Highest local index written into the code.
    max_local: Option<u32>,
}

impl WriteContext {
    /// Create a context for an empty code stream.
    pub fn new(options: WriteOptions) -> Self {
        Self {
            code: BcCode::new(),
            slots: SlotFrame::new(),
            jumps: JumpResolver::new(),
            fixed_locals: options.fixed_locals,
            current: None,
            instr_index: 0,
            accounted_words: 0,
            max_local: None,
        }
    }

    /// Set the index of the IR instruction about to be written.
    pub fn set_instr_index(&mut self, index: usize) {
        self.instr_index = index;
    }

    /// Position hint of the instruction being written.
    fn loc(&self) -> LocOffset {
        self.current.map_or(LocOffset::UNKNOWN, |pending| pending.loc)
    }

    // ==========================================================================
    // Instruction framing
    // ==========================================================================

    /// Start an instruction by writing its opcode word.
    pub fn begin(&mut self, opcode: Opcode, loc: LocOffset) {
        self.current = Some(Pending {
            opcode,
            start: self.code.current_offset(),
            loc,
        });
        self.code.write_op(opcode, loc);
    }

    /// Finish the current instruction, checking it filled exactly its width.
    pub fn end(&mut self) -> Result<(), LoweringError> {
        let Some(pending) = self.current.take() else {
            return Ok(());
        };
        let written = self.code.current_offset() - pending.start;
        if written != pending.opcode.width() {
            return Err(LoweringError::WidthMismatch {
                opcode: pending.opcode.name(),
                expected: pending.opcode.width(),
                written,
            });
        }
        self.accounted_words += written;
        Ok(())
    }

    // ==========================================================================
    // Operands
    // ==========================================================================

    /// Write a slot operand.
    pub fn write_slot(&mut self, slot: &BcIrSlot) -> Result<(), LoweringError> {
        let operand = match slot {
            BcIrSlot::Local(local) => self.local_operand(AnyLocal::Local(*local))?,
            BcIrSlot::Lazy(lazy) => self.local_operand(AnyLocal::Lazy(*lazy))?,
            BcIrSlot::Global(index) => SlotOperand::new(SlotKind::Global, *index)?,
            BcIrSlot::Cell(index) => SlotOperand::new(SlotKind::Cell, *index)?,
            BcIrSlot::Free(index) => SlotOperand::new(SlotKind::Free, *index)?,
            BcIrSlot::Const(value) => self.const_operand(value.clone())?,
        };
        self.write_operand(operand);
        Ok(())
    }

    /// Write a local operand.
    pub fn write_local(&mut self, local: AnyLocal) -> Result<(), LoweringError> {
        let operand = self.local_operand(local)?;
        self.write_operand(operand);
        Ok(())
    }

    /// Write a reference to a constant, adding it to the pool.
    pub fn write_const(&mut self, value: Value) -> Result<(), LoweringError> {
        let operand = self.const_operand(value)?;
        self.write_operand(operand);
        Ok(())
    }

    /// Write a raw immediate word.
    pub fn write_imm(&mut self, imm: u32) {
        self.code.write_word(imm, self.loc());
    }

    /// Reserve an address operand to be patched with `label`'s address.
    pub fn write_jump(&mut self, label: JumpLabel) -> Result<(), LoweringError> {
        let offset = self.code.current_offset();
        self.jumps.add_fixup(label, offset, self.instr_index)?;
        self.code.write_word(UNRESOLVED_ADDRESS, self.loc());
        Ok(())
    }

    fn write_operand(&mut self, operand: SlotOperand) {
        self.code.write_word(operand.encode(), self.loc());
    }

    fn local_operand(&mut self, local: AnyLocal) -> Result<SlotOperand, LoweringError> {
        let index = match local {
            AnyLocal::Local(local) => {
                if local.index() >= self.fixed_locals {
                    return Err(LoweringError::LocalOutOfFrame {
                        index: local.index(),
                        fixed_locals: self.fixed_locals,
                    });
                }
                local.index()
            }
            AnyLocal::Lazy(lazy) => {
                let relative = self.slots.resolve(lazy)?;
                self.fixed_locals
                    .checked_add(relative)
                    .ok_or(LoweringError::OperandOverflow { index: u32::MAX })?
            }
        };
        self.max_local = Some(self.max_local.map_or(index, |max| max.max(index)));
        SlotOperand::new(SlotKind::Local, index)
    }

    fn const_operand(&mut self, value: Value) -> Result<SlotOperand, LoweringError> {
        let index = self.code.constants.add(value);
        SlotOperand::new(SlotKind::Const, index)
    }

    // ==========================================================================
    // Structural instructions
    // ==========================================================================

    /// Bind a symbolic local to a frame slot.
    pub fn alloc_slot(&mut self, local: LazyLocal) -> Result<(), LoweringError> {
        self.slots.alloc(local).map(|_| ())
    }

    /// Release a symbolic local's frame slot.
    pub fn release_slot(&mut self, local: LazyLocal) -> Result<(), LoweringError> {
        self.slots.release(local)
    }

    /// Make the current position the target of `label`.
    pub fn place_label(&mut self, label: JumpLabel) -> Result<(), LoweringError> {
        let address = self.code.current_offset() as u32;
        self.jumps.place(label, address)?;
        trace!(%label, address, "placed label");
        Ok(())
    }

    /// Write a loop init and open a loop context.
    pub fn for_init(
        &mut self,
        loc: LocOffset,
        collection: &BcIrSlot,
        item: AnyLocal,
    ) -> Result<(), LoweringError> {
        self.begin(Opcode::ForInit, loc);
        self.write_slot(collection)?;
        self.write_local(item)?;
        let end_fixup = self.code.current_offset();
        self.code.write_word(UNRESOLVED_ADDRESS, loc);
        self.end()?;

        self.jumps.enter_loop(LoopContext {
            item,
            body: self.code.current_offset() as u32,
            end_fixup,
        });
        Ok(())
    }

    /// Close the innermost loop: jump back to its body and patch its exit.
    ///
    /// The item local is resolved again, so releasing it inside the body
    /// fails instead of aliasing whatever reused its slot.
    pub fn for_close(&mut self, loc: LocOffset) -> Result<(), LoweringError> {
        let ctx = self.jumps.exit_loop()?;
        self.begin(Opcode::Continue, loc);
        self.write_local(ctx.item)?;
        self.code.write_word(ctx.body, loc);
        self.end()?;

        let end = self.code.current_offset() as u32;
        self.code.patch_word(ctx.end_fixup, end);
        Ok(())
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Patch all branches and validate the finished code.
    pub fn finish(mut self) -> Result<BcCode, LoweringError> {
        for (offset, address) in self.jumps.resolve()? {
            self.code.patch_word(offset, address);
        }
        for label in self.jumps.unreferenced_labels() {
            warn!(%label, "label placed without a branch targeting it");
        }

        let frame_size = self.assert_written_correctly()?;
        self.code.frame_size = frame_size;
        Ok(self.code)
    }

    /// Check the code against the bookkeeping, returning the frame size.
    fn assert_written_correctly(&self) -> Result<u32, LoweringError> {
        if self.jumps.loop_depth() > 0 {
            return Err(LoweringError::UnclosedLoop {
                count: self.jumps.loop_depth(),
            });
        }

        if self.accounted_words != self.code.len() {
            return Err(LoweringError::StreamLengthMismatch {
                expected: self.accounted_words,
                actual: self.code.len(),
            });
        }

        let frame_size = self
            .fixed_locals
            .checked_add(self.slots.high_water())
            .ok_or(LoweringError::OperandOverflow { index: u32::MAX })?;
        match self.max_local {
            Some(index) if index >= frame_size => {
                Err(LoweringError::FrameSizeMismatch { frame_size, index })
            }
            _ => Ok(frame_size),
        }
    }
}
