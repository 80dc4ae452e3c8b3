//! Slot operands of IR instructions.
//!
//! IR refers to storage in two ways: resolved [`Local`]s, whose frame index is
//! already known to the front end (parameters and declared locals), and
//! symbolic [`LazyLocal`]s, which only get a frame index when the IR is
//! lowered. Both are [`AnyLocal`]s, i.e. usable wherever an instruction needs
//! its operand in a local. [`BcIrSlot`] additionally covers constants,
//! globals, cells and free variables.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use bcir_core::Value;

/// Source of lazy local identities. Process-wide, so locals allocated by
/// independently built units never collide when the units are concatenated.
static NEXT_LAZY_LOCAL: AtomicU64 = AtomicU64::new(0);

/// A local with a known frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Local {
    index: u32,
}

impl Local {
    /// Local at the given frame index.
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// Frame index.
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.index)
    }
}

/// A symbolic local, bound to a frame index during lowering.
///
/// Two lazy locals are equal only if they are the same allocation; the label
/// is for diagnostics and does not take part in comparisons.
///
/// Lazy locals can only be obtained from [`BcIr::allocate`] and
/// [`BcIr::materialize`], so every one of them has an allocation instruction:
///
/// ```compile_fail
/// use bcir_compiler::ir::LazyLocal;
///
/// let forged = LazyLocal { id: 0, label: "forged" };
/// ```
///
/// [`BcIr::allocate`]: super::BcIr::allocate
/// [`BcIr::materialize`]: super::BcIr::materialize
#[derive(Clone, Copy)]
pub struct LazyLocal {
    id: u64,
    label: &'static str,
}

impl LazyLocal {
    pub(super) fn new(label: &'static str) -> Self {
        Self {
            id: NEXT_LAZY_LOCAL.fetch_add(1, Ordering::Relaxed),
            label,
        }
    }

    /// Diagnostic label given at allocation.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl PartialEq for LazyLocal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LazyLocal {}

impl Hash for LazyLocal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for LazyLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label, self.id)
    }
}

impl fmt::Display for LazyLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Either kind of local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnyLocal {
    /// Known frame index.
    Local(Local),
    /// Symbolic, resolved during lowering.
    Lazy(LazyLocal),
}

impl From<Local> for AnyLocal {
    fn from(local: Local) -> Self {
        AnyLocal::Local(local)
    }
}

impl From<LazyLocal> for AnyLocal {
    fn from(local: LazyLocal) -> Self {
        AnyLocal::Lazy(local)
    }
}

impl fmt::Display for AnyLocal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyLocal::Local(local) => write!(f, "{local}"),
            AnyLocal::Lazy(lazy) => write!(f, "{lazy}"),
        }
    }
}

/// Any operand an IR instruction can read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BcIrSlot {
    /// Local with a known frame index.
    Local(Local),
    /// Symbolic local.
    Lazy(LazyLocal),
    /// Module global by index.
    Global(u32),
    /// Cell of a captured local by index.
    Cell(u32),
    /// Free variable of the enclosing closure by index.
    Free(u32),
    /// Compile-time constant.
    Const(Value),
}

impl BcIrSlot {
    /// The operand as a local, if it already lives in one.
    pub fn as_any_local(&self) -> Option<AnyLocal> {
        match self {
            BcIrSlot::Local(local) => Some(AnyLocal::Local(*local)),
            BcIrSlot::Lazy(lazy) => Some(AnyLocal::Lazy(*lazy)),
            BcIrSlot::Global(_) | BcIrSlot::Cell(_) | BcIrSlot::Free(_) | BcIrSlot::Const(_) => {
                None
            }
        }
    }

    /// The constant value, if this operand is a constant.
    pub fn const_value(&self) -> Option<&Value> {
        match self {
            BcIrSlot::Const(value) => Some(value),
            _ => None,
        }
    }
}

impl From<AnyLocal> for BcIrSlot {
    fn from(local: AnyLocal) -> Self {
        match local {
            AnyLocal::Local(local) => BcIrSlot::Local(local),
            AnyLocal::Lazy(lazy) => BcIrSlot::Lazy(lazy),
        }
    }
}

impl From<Local> for BcIrSlot {
    fn from(local: Local) -> Self {
        BcIrSlot::Local(local)
    }
}

impl From<LazyLocal> for BcIrSlot {
    fn from(local: LazyLocal) -> Self {
        BcIrSlot::Lazy(local)
    }
}

impl From<Value> for BcIrSlot {
    fn from(value: Value) -> Self {
        BcIrSlot::Const(value)
    }
}

impl fmt::Display for BcIrSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcIrSlot::Local(local) => write!(f, "{local}"),
            BcIrSlot::Lazy(lazy) => write!(f, "{lazy}"),
            BcIrSlot::Global(index) => write!(f, "G{index}"),
            BcIrSlot::Cell(index) => write!(f, "CELL{index}"),
            BcIrSlot::Free(index) => write!(f, "FREE{index}"),
            BcIrSlot::Const(value) => write!(f, "{value}"),
        }
    }
}
