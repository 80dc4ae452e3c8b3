//! Forward jump labels.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_JUMP_LABEL: AtomicU64 = AtomicU64::new(0);

/// Symbolic target of a forward branch.
///
/// A label is created together with the branch that jumps to it and must be
/// placed exactly once, after that branch. Lowering turns the placement into
/// an absolute address and patches every branch targeting the label.
///
/// Labels can only be obtained from [`BcIr::branch`] and friends:
///
/// ```compile_fail
/// use bcir_compiler::ir::JumpLabel;
///
/// let forged = JumpLabel { id: 0 };
/// ```
///
/// [`BcIr::branch`]: super::BcIr::branch
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct JumpLabel {
    id: u64,
}

impl JumpLabel {
    pub(super) fn new() -> Self {
        Self {
            id: NEXT_JUMP_LABEL.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for JumpLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.id)
    }
}

impl fmt::Display for JumpLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
