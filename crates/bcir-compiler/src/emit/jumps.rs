//! Jump resolution for lowering.
//!
//! This module tracks forward branches whose target address is not yet known,
//! the addresses labels were placed at, and the stack of open `for` loops.

use bcir_core::LoweringError;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ir::{AnyLocal, JumpLabel};

/// A reserved address operand waiting for its label.
#[derive(Debug)]
struct Fixup {
    /// Word offset of the address operand.
    offset: usize,
    /// Label the branch targets.
    label: JumpLabel,
    /// Index of the branch instruction (for diagnostics).
    branch: usize,
}

/// Context for a single open loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LoopContext {
    /// Item local bound by the loop init.
    pub item: AnyLocal,
    /// Address of the first body instruction.
    pub body: u32,
    /// Word offset of the loop init's end address operand.
    pub end_fixup: usize,
}

/// Label addresses and pending branch fixups of one lowering pass.
#[derive(Debug, Default)]
pub(crate) struct JumpResolver {
    /// Address of every placed label.
    placed: FxHashMap<JumpLabel, u32>,
    /// Labels targeted by at least one branch.
    branched: FxHashSet<JumpLabel>,
    /// Branches waiting for their label.
    fixups: Vec<Fixup>,
    /// Stack of open loops (innermost last).
    loops: Vec<LoopContext>,
}

impl JumpResolver {
    /// Create a new jump resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a branch operand at `offset` targeting `label`.
    ///
    /// Labels only describe forward jumps, so the label must not have been
    /// placed yet.
    pub fn add_fixup(
        &mut self,
        label: JumpLabel,
        offset: usize,
        branch: usize,
    ) -> Result<(), LoweringError> {
        if self.placed.contains_key(&label) {
            return Err(LoweringError::BackwardJump {
                label: label.to_string(),
            });
        }
        self.branched.insert(label);
        self.fixups.push(Fixup {
            offset,
            label,
            branch,
        });
        Ok(())
    }

    /// Record that `label` targets `address`.
    pub fn place(&mut self, label: JumpLabel, address: u32) -> Result<(), LoweringError> {
        if self.placed.contains_key(&label) {
            return Err(LoweringError::LabelPlacedTwice {
                label: label.to_string(),
            });
        }
        self.placed.insert(label, address);
        Ok(())
    }

    /// Resolve every pending branch.
    ///
    /// Returns `(operand offset, target address)` pairs to patch, in the
    /// order the branches were written.
    pub fn resolve(&self) -> Result<Vec<(usize, u32)>, LoweringError> {
        self.fixups
            .iter()
            .map(|fixup| match self.placed.get(&fixup.label) {
                Some(&address) => Ok((fixup.offset, address)),
                None => Err(LoweringError::UnresolvedJump {
                    label: fixup.label.to_string(),
                    branch: fixup.branch,
                }),
            })
            .collect()
    }

    /// Labels placed without any branch targeting them.
    pub fn unreferenced_labels(&self) -> impl Iterator<Item = JumpLabel> + '_ {
        self.placed
            .keys()
            .copied()
            .filter(|label| !self.branched.contains(label))
    }

    /// Enter a new loop context.
    pub fn enter_loop(&mut self, ctx: LoopContext) {
        self.loops.push(ctx);
    }

    /// Exit the innermost loop context.
    pub fn exit_loop(&mut self) -> Result<LoopContext, LoweringError> {
        self.loops.pop().ok_or(LoweringError::UnbalancedLoopClose)
    }

    /// Get the current loop nesting depth.
    pub fn loop_depth(&self) -> usize {
        self.loops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BcIr, Local};
    use bcir_core::LocOffset;

    fn labels(n: usize) -> Vec<JumpLabel> {
        let mut ir = BcIr::new();
        (0..n).map(|_| ir.branch(LocOffset::UNKNOWN)).collect()
    }

    #[test]
    fn resolve_forward_jumps() {
        let l = labels(2);
        let mut jumps = JumpResolver::new();
        jumps.add_fixup(l[0], 1, 0).unwrap();
        jumps.add_fixup(l[1], 3, 1).unwrap();
        jumps.add_fixup(l[0], 5, 2).unwrap();
        jumps.place(l[0], 10).unwrap();
        jumps.place(l[1], 6).unwrap();

        assert_eq!(jumps.resolve(), Ok(vec![(1, 10), (3, 6), (5, 10)]));
    }

    #[test]
    fn place_twice() {
        let l = labels(1);
        let mut jumps = JumpResolver::new();
        jumps.place(l[0], 0).unwrap();
        assert!(matches!(
            jumps.place(l[0], 4),
            Err(LoweringError::LabelPlacedTwice { .. })
        ));
    }

    #[test]
    fn unresolved_jump_names_branch() {
        let l = labels(1);
        let mut jumps = JumpResolver::new();
        jumps.add_fixup(l[0], 1, 7).unwrap();
        assert!(matches!(
            jumps.resolve(),
            Err(LoweringError::UnresolvedJump { branch: 7, .. })
        ));
    }

    #[test]
    fn backward_jump_rejected() {
        let l = labels(1);
        let mut jumps = JumpResolver::new();
        jumps.place(l[0], 0).unwrap();
        assert!(matches!(
            jumps.add_fixup(l[0], 1, 1),
            Err(LoweringError::BackwardJump { .. })
        ));
    }

    #[test]
    fn unreferenced_labels() {
        let l = labels(2);
        let mut jumps = JumpResolver::new();
        jumps.add_fixup(l[0], 1, 0).unwrap();
        jumps.place(l[0], 2).unwrap();
        jumps.place(l[1], 2).unwrap();
        assert_eq!(jumps.unreferenced_labels().collect::<Vec<_>>(), vec![l[1]]);
    }

    #[test]
    fn nested_loops() {
        let mut jumps = JumpResolver::new();
        let outer = LoopContext {
            item: AnyLocal::Local(Local::new(0)),
            body: 4,
            end_fixup: 3,
        };
        let inner = LoopContext {
            item: AnyLocal::Local(Local::new(1)),
            body: 8,
            end_fixup: 7,
        };
        jumps.enter_loop(outer);
        jumps.enter_loop(inner);
        assert_eq!(jumps.loop_depth(), 2);

        assert_eq!(jumps.exit_loop(), Ok(inner));
        assert_eq!(jumps.exit_loop(), Ok(outer));
        assert_eq!(jumps.exit_loop(), Err(LoweringError::UnbalancedLoopClose));
    }
}
