//! Address-independent bytecode IR.
//!
//! A [`BcIr`] is the compilation unit the front end builds. It holds a flat
//! list of [`BcIrInstr`]s that refer to storage through [`BcIrSlot`]s and to
//! jump targets through [`JumpLabel`]s, never through frame indices or
//! addresses. Units can therefore be built independently and concatenated
//! with [`BcIr::append`] before being lowered once with [`BcIr::write`].
//!
//! ```
//! use bcir_compiler::bytecode::{JumpCond, Opcode};
//! use bcir_compiler::emit::WriteOptions;
//! use bcir_compiler::ir::{BcIr, BcIrInstr, Local};
//! use bcir_core::{LocOffset, Value};
//!
//! let loc = LocOffset::line(1);
//! let mut ir = BcIr::new();
//! let skip = ir.branch_if(loc, Local::new(0).into(), JumpCond::IfFalse);
//! ir.add(BcIrInstr::ret(loc, Value::Int(1)));
//! ir.place_label(skip);
//! ir.add(BcIrInstr::ret(loc, Value::None));
//!
//! let code = ir.write(WriteOptions::new(1)).unwrap();
//! code.assert_opcodes(&[Opcode::IfNotBr, Opcode::Return, Opcode::Return]);
//! ```

mod instr;
mod label;
mod recognize;
mod slot;

use std::fmt;

use bcir_core::{LocOffset, LoweringError, WriteError};
use tracing::debug;

use crate::bytecode::{BcCode, JumpCond};
use crate::emit::{WriteContext, WriteOptions};

pub use instr::{BcIrInstr, BcIrOperand};
pub use label::JumpLabel;
pub use slot::{AnyLocal, BcIrSlot, LazyLocal, Local};

/// An ordered, append-only sequence of IR instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BcIr {
    instructions: Vec<BcIrInstr>,
}

impl BcIr {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction.
    pub fn add(&mut self, instr: BcIrInstr) {
        self.instructions.push(instr);
    }

    /// Move all instructions of `other` onto the end of this sequence.
    pub fn append(&mut self, mut other: BcIr) {
        self.instructions.append(&mut other.instructions);
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Whether the sequence has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The instructions in order.
    pub fn instructions(&self) -> &[BcIrInstr] {
        &self.instructions
    }

    // ==========================================================================
    // Slots
    // ==========================================================================

    /// Allocate a fresh symbolic local.
    ///
    /// `label` only shows up in listings and diagnostics.
    pub fn allocate(&mut self, label: &'static str) -> LazyLocal {
        let local = LazyLocal::new(label);
        self.add(BcIrInstr::AllocSlot { local });
        local
    }

    /// Release a symbolic local's frame slot for reuse.
    pub fn release(&mut self, local: LazyLocal) {
        self.add(BcIrInstr::ReleaseSlot { local });
    }

    /// Make `operand` available in a local.
    ///
    /// Operands already in a local are returned as is, without emitting
    /// anything. Anything else is copied into a freshly allocated local.
    pub fn materialize(
        &mut self,
        loc: LocOffset,
        operand: impl Into<BcIrSlot>,
        label: &'static str,
    ) -> AnyLocal {
        let operand = operand.into();
        if let Some(local) = operand.as_any_local() {
            return local;
        }

        let local = self.allocate(label);
        self.add(BcIrInstr::Cp {
            loc,
            src: operand,
            dest: AnyLocal::Lazy(local),
        });
        AnyLocal::Lazy(local)
    }

    // ==========================================================================
    // Branches
    // ==========================================================================

    /// Emit an unconditional forward branch and return its target label.
    pub fn branch(&mut self, loc: LocOffset) -> JumpLabel {
        let label = JumpLabel::new();
        self.add(BcIrInstr::Br { loc, label });
        label
    }

    /// Emit a forward branch taken when `cond` satisfies `jump_cond`.
    pub fn branch_if(&mut self, loc: LocOffset, cond: AnyLocal, jump_cond: JumpCond) -> JumpLabel {
        let label = JumpLabel::new();
        self.add(BcIrInstr::IfBr {
            loc,
            cond,
            jump_cond,
            label,
        });
        label
    }

    /// Like [`branch_if`](Self::branch_if), materializing `cond` first.
    pub fn branch_if_slot(
        &mut self,
        loc: LocOffset,
        cond: impl Into<BcIrSlot>,
        jump_cond: JumpCond,
    ) -> JumpLabel {
        let cond = self.materialize(loc, cond, "cond");
        self.branch_if(loc, cond, jump_cond)
    }

    /// Place `label` at the current position.
    pub fn place_label(&mut self, label: JumpLabel) {
        self.add(BcIrInstr::PlaceLabel { label });
    }

    /// Place all `labels` at the current position.
    pub fn place_labels(&mut self, labels: impl IntoIterator<Item = JumpLabel>) {
        self.instructions
            .extend(labels.into_iter().map(|label| BcIrInstr::PlaceLabel { label }));
    }

    /// Start a `for` loop binding each element of `collection` to `item`.
    pub fn for_init(&mut self, loc: LocOffset, collection: impl Into<BcIrSlot>, item: AnyLocal) {
        self.add(BcIrInstr::ForInit {
            loc,
            collection: collection.into(),
            item,
        });
    }

    /// Close the innermost open `for` loop.
    pub fn for_close(&mut self, loc: LocOffset) {
        self.add(BcIrInstr::ForClose { loc });
    }

    // ==========================================================================
    // Checks and lowering
    // ==========================================================================

    /// Assert that the sequence still has `size` instructions.
    ///
    /// # Panics
    ///
    /// Panics with the instructions around `size` if the length differs.
    #[track_caller]
    pub fn assert_unchanged(&self, size: usize) {
        let len = self.instructions.len();
        if len > size {
            panic!(
                "IR changed, expected size: {}, saved: {}, extra: {}",
                size,
                Listing(&self.instructions[..size]),
                Listing(&self.instructions[size..]),
            );
        }
        if len < size {
            panic!("IR changed, expected size: {}, actual: {}", size, self);
        }
    }

    /// Lower the sequence to executable code.
    ///
    /// Fails only when the sequence is malformed, which means whatever built
    /// it has a bug. No partial code is returned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(&self, options: WriteOptions) -> Result<BcCode, WriteError> {
        let mut ctx = WriteContext::new(options);
        for (index, instr) in self.instructions.iter().enumerate() {
            ctx.set_instr_index(index);
            instr
                .write(&mut ctx)
                .map_err(|source| WriteError::Instruction {
                    index,
                    listing: self.to_string(),
                    source,
                })?;
        }

        let code = ctx.finish().map_err(|source| match source {
            LoweringError::UnresolvedJump { branch, .. } => WriteError::Instruction {
                index: branch,
                listing: self.to_string(),
                source,
            },
            source => WriteError::Finalize {
                listing: self.to_string(),
                source,
            },
        })?;

        debug!(
            instructions = self.instructions.len(),
            words = code.len(),
            frame_size = code.frame_size(),
            constants = code.constants().len(),
            "lowered IR"
        );
        Ok(code)
    }
}

/// Renders instructions as `[a, b, c]`.
struct Listing<'a>(&'a [BcIrInstr]);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, instr) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{instr}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for BcIr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Listing(&self.instructions).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;
    use bcir_core::Value;

    const LOC: LocOffset = LocOffset::UNKNOWN;

    #[test]
    fn materialize_local_emits_nothing() {
        let mut ir = BcIr::new();
        let param = ir.materialize(LOC, Local::new(0), "x");
        assert_eq!(param, AnyLocal::Local(Local::new(0)));
        assert!(ir.is_empty());

        let tmp = ir.allocate("tmp");
        assert_eq!(ir.materialize(LOC, tmp, "x"), AnyLocal::Lazy(tmp));
        assert_eq!(ir.len(), 1);
    }

    #[test]
    fn materialize_constant_copies_every_time() {
        let mut ir = BcIr::new();
        let a = ir.materialize(LOC, Value::Int(1), "c");
        let b = ir.materialize(LOC, Value::Int(1), "c");
        assert_ne!(a, b);
        assert_eq!(ir.len(), 4);
        assert!(matches!(ir.instructions()[1], BcIrInstr::Cp { .. }));
        assert!(matches!(ir.instructions()[3], BcIrInstr::Cp { .. }));
    }

    #[test]
    fn branch_if_slot_materializes_condition() {
        let mut ir = BcIr::new();
        let label = ir.branch_if_slot(LOC, BcIrSlot::Global(0), JumpCond::IfTrue);
        ir.place_label(label);
        assert_eq!(ir.len(), 4);

        let code = ir.write(WriteOptions::default()).unwrap();
        code.assert_opcodes(&[Opcode::Cp, Opcode::IfBr]);
        assert_eq!(code.frame_size(), 1);
    }

    #[test]
    fn place_labels_in_bulk() {
        let mut ir = BcIr::new();
        let a = ir.branch(LOC);
        let b = ir.branch(LOC);
        ir.place_labels([a, b]);

        let code = ir.write(WriteOptions::default()).unwrap();
        // Both branches land past the end of the code.
        let targets: Vec<u32> = code
            .instructions()
            .flat_map(|instr| instr.addresses().collect::<Vec<_>>())
            .collect();
        assert_eq!(targets, vec![4, 4]);
    }

    #[test]
    fn append_keeps_order() {
        let mut a = BcIr::new();
        a.add(BcIrInstr::ret(LOC, Value::Int(1)));
        let mut b = BcIr::new();
        b.add(BcIrInstr::ret(LOC, Value::Int(2)));
        b.add(BcIrInstr::ret(LOC, Value::Int(3)));

        a.append(b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.to_string(), "[Return(1), Return(2), Return(3)]");
    }

    #[test]
    fn assert_unchanged_same_size() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Value::None));
        ir.assert_unchanged(1);
    }

    #[test]
    #[should_panic(expected = "IR changed, expected size: 1, saved: [Return(None)], extra: [Return(2)]")]
    fn assert_unchanged_grown() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Value::None));
        ir.add(BcIrInstr::ret(LOC, Value::Int(2)));
        ir.assert_unchanged(1);
    }

    #[test]
    #[should_panic(expected = "IR changed, expected size: 2, actual: [Return(None)]")]
    fn assert_unchanged_shrunk() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Value::None));
        ir.assert_unchanged(2);
    }

    #[test]
    fn write_error_names_instruction() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Local::new(3)));
        let err = ir.write(WriteOptions::new(1)).unwrap_err();
        assert_eq!(err.instruction_index(), Some(0));
        assert_eq!(err.listing(), "[Return(L3)]");
        assert!(matches!(err.kind(), LoweringError::LocalOutOfFrame { index: 3, .. }));
    }

    #[test]
    fn unresolved_jump_names_branch() {
        let mut ir = BcIr::new();
        ir.add(BcIrInstr::ret(LOC, Value::None));
        ir.branch(LOC);
        let err = ir.write(WriteOptions::default()).unwrap_err();
        assert_eq!(err.instruction_index(), Some(1));
        assert!(err.to_string().starts_with("failed to write instruction 1 of [Return(None), Br(J"));
    }

    #[test]
    fn unclosed_loop_fails_at_finalize() {
        let mut ir = BcIr::new();
        let item = ir.allocate("item");
        ir.for_init(LOC, Local::new(0), item.into());
        let err = ir.write(WriteOptions::new(1)).unwrap_err();
        assert_eq!(err.instruction_index(), None);
        assert_eq!(err.kind(), &LoweringError::UnclosedLoop { count: 1 });
    }
}
