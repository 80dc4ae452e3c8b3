//! Error types for IR lowering.
//!
//! Lowering never fails because of user input: by the time IR reaches the
//! assembler the front end has already type checked and scoped the program.
//! Every error here therefore reports a bug in whatever produced the IR.
//!
//! ## Error Hierarchy
//!
//! ```text
//! WriteError (what `BcIr::write` returns)
//! ├── Instruction { index, listing, source: LoweringError }
//! └── Finalize    { listing, source: LoweringError }
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use bcir_core::WriteError;
//!
//! fn compile_unit(ir: &BcIr) -> Result<BcCode, WriteError> {
//!     let code = ir.write(WriteOptions::new(2))?; // abort the unit on error
//!     Ok(code)
//! }
//! ```

use thiserror::Error;

// ============================================================================
// Lowering Errors
// ============================================================================

/// Internal-consistency failures detected while lowering IR to bytecode.
///
/// Slot and label names are rendered into strings at the point of failure so
/// the error can outlive the IR it was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    /// A symbolic local was read or written without a prior allocation.
    #[error("slot {slot} is used before it is allocated")]
    UnresolvedSlot {
        /// The offending slot.
        slot: String,
    },

    /// A symbolic local was allocated by two instructions.
    #[error("slot {slot} is allocated twice")]
    SlotAllocatedTwice {
        /// The offending slot.
        slot: String,
    },

    /// A symbolic local was used after its release.
    #[error("slot {slot} is used after it was released")]
    SlotReleased {
        /// The offending slot.
        slot: String,
    },

    /// A symbolic local was released without being allocated.
    #[error("slot {slot} is released but was never allocated")]
    ReleaseOfUnallocated {
        /// The offending slot.
        slot: String,
    },

    /// A resolved local index lies outside the fixed part of the frame.
    #[error("local {index} is outside the frame of {fixed_locals} fixed locals")]
    LocalOutOfFrame {
        /// The local index.
        index: u32,
        /// Number of fixed locals of the unit.
        fixed_locals: u32,
    },

    /// An index does not fit in the operand encoding.
    #[error("operand index {index} does not fit in an operand word")]
    OperandOverflow {
        /// The index that overflowed.
        index: u32,
    },

    /// A jump label was placed more than once.
    #[error("label {label} is placed twice")]
    LabelPlacedTwice {
        /// The offending label.
        label: String,
    },

    /// A branch refers to a label that was never placed.
    #[error("jump to label {label} from instruction {branch} is never resolved")]
    UnresolvedJump {
        /// The unplaced label.
        label: String,
        /// Index of the branch instruction.
        branch: usize,
    },

    /// A label was placed before the branch that targets it.
    #[error("label {label} is placed before its branch, only forward jumps are supported")]
    BackwardJump {
        /// The offending label.
        label: String,
    },

    /// A loop close without a matching loop init.
    #[error("loop close without a matching loop init")]
    UnbalancedLoopClose,

    /// Loops still open when the unit ends.
    #[error("{count} loop(s) not closed")]
    UnclosedLoop {
        /// Number of open loops.
        count: usize,
    },

    /// A generic instruction was built with the wrong number of operands.
    #[error("opcode {opcode} takes {expected} operands, got {actual}")]
    OperandCountMismatch {
        /// Opcode name.
        opcode: &'static str,
        /// Operands the opcode takes.
        expected: usize,
        /// Operands supplied.
        actual: usize,
    },

    /// An instruction wrote a different number of words than its opcode reserves.
    #[error("instruction {opcode} wrote {written} words, expected {expected}")]
    WidthMismatch {
        /// Opcode name.
        opcode: &'static str,
        /// Words reserved by the opcode, including the opcode word.
        expected: usize,
        /// Words actually written.
        written: usize,
    },

    /// A generic instruction used an opcode that needs address resolution.
    #[error("opcode {opcode} is reserved to structural instructions")]
    ReservedOpcode {
        /// Opcode name.
        opcode: &'static str,
    },

    /// The final frame does not cover a local written into the code.
    #[error("frame size {frame_size} does not cover local {index}")]
    FrameSizeMismatch {
        /// Final frame size.
        frame_size: u32,
        /// Highest local index referenced.
        index: u32,
    },

    /// The final stream length disagrees with the per-instruction bookkeeping.
    #[error("code has {actual} words, instructions account for {expected}")]
    StreamLengthMismatch {
        /// Words accounted for by instructions.
        expected: usize,
        /// Words in the stream.
        actual: usize,
    },
}

// ============================================================================
// Write Errors
// ============================================================================

/// A failed lowering of one compilation unit.
///
/// Carries the full rendered instruction list so the failure can be
/// diagnosed without access to the IR.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// Failure attributable to a single instruction.
    #[error("failed to write instruction {index} of {listing}: {source}")]
    Instruction {
        /// Index of the offending instruction.
        index: usize,
        /// Rendered instruction list.
        listing: String,
        /// What went wrong.
        #[source]
        source: LoweringError,
    },

    /// Failure detected when validating the finished stream.
    #[error("failed to write {listing}: {source}")]
    Finalize {
        /// Rendered instruction list.
        listing: String,
        /// What went wrong.
        #[source]
        source: LoweringError,
    },
}

impl WriteError {
    /// The underlying lowering failure.
    pub fn kind(&self) -> &LoweringError {
        match self {
            WriteError::Instruction { source, .. } => source,
            WriteError::Finalize { source, .. } => source,
        }
    }

    /// Index of the offending instruction, if the failure has one.
    pub fn instruction_index(&self) -> Option<usize> {
        match self {
            WriteError::Instruction { index, .. } => Some(*index),
            WriteError::Finalize { .. } => None,
        }
    }

    /// Rendered instruction list of the unit that failed.
    pub fn listing(&self) -> &str {
        match self {
            WriteError::Instruction { listing, .. } => listing,
            WriteError::Finalize { listing, .. } => listing,
        }
    }
}
