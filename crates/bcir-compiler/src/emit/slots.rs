//! Frame slot assignment for symbolic locals.
//!
//! Slots are handed out bump-style in allocation order. Releasing the most
//! recently allocated live slot shrinks the frame again; releasing any other
//! slot only retires it, so indices already written into the code stay valid.
//! A retired slot is reclaimed once every slot above it has been released.

use bcir_core::LoweringError;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::ir::LazyLocal;

/// What lowering knows about a symbolic local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// Bound to a frame slot (relative to the first lazy slot).
    Live(u32),
    /// Released; any further use is an error.
    Released,
}

/// Slot assignment state of one lowering pass.
#[derive(Debug, Default)]
pub(crate) struct SlotFrame {
    /// Binding of every local seen so far.
    bindings: FxHashMap<LazyLocal, Binding>,
    /// Allocated slots in order; `true` marks a retired slot.
    retired: Vec<bool>,
    /// Largest number of slots simultaneously in use.
    high_water: u32,
}

impl SlotFrame {
    /// Create an empty slot frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `local` to the next free slot and return its relative index.
    pub fn alloc(&mut self, local: LazyLocal) -> Result<u32, LoweringError> {
        if self.bindings.contains_key(&local) {
            return Err(LoweringError::SlotAllocatedTwice {
                slot: local.to_string(),
            });
        }

        let index = self.retired.len() as u32;
        self.retired.push(false);
        self.bindings.insert(local, Binding::Live(index));
        self.high_water = self.high_water.max(index + 1);
        trace!(slot = %local, index, "allocated slot");
        Ok(index)
    }

    /// Release the slot bound to `local`.
    pub fn release(&mut self, local: LazyLocal) -> Result<(), LoweringError> {
        let index = match self.bindings.get(&local) {
            Some(Binding::Live(index)) => *index,
            Some(Binding::Released) => {
                return Err(LoweringError::SlotReleased {
                    slot: local.to_string(),
                });
            }
            None => {
                return Err(LoweringError::ReleaseOfUnallocated {
                    slot: local.to_string(),
                });
            }
        };

        self.bindings.insert(local, Binding::Released);
        self.retired[index as usize] = true;
        while self.retired.last() == Some(&true) {
            self.retired.pop();
        }
        trace!(slot = %local, index, next_free = self.next_free(), "released slot");
        Ok(())
    }

    /// Relative slot index of a live local.
    pub fn resolve(&self, local: LazyLocal) -> Result<u32, LoweringError> {
        match self.bindings.get(&local) {
            Some(Binding::Live(index)) => Ok(*index),
            Some(Binding::Released) => Err(LoweringError::SlotReleased {
                slot: local.to_string(),
            }),
            None => Err(LoweringError::UnresolvedSlot {
                slot: local.to_string(),
            }),
        }
    }

    /// Relative index the next allocation will get.
    pub fn next_free(&self) -> u32 {
        self.retired.len() as u32
    }

    /// Number of slots the frame needs for the lazy locals.
    pub fn high_water(&self) -> u32 {
        self.high_water
    }
}
