//! Source position hints for emitted instructions.
//!
//! Provides [`LocOffset`] so every word of the final bytecode can be traced
//! back to the source construct that produced it.

use std::fmt;

/// Position hint for an instruction, represented by its starting position.
///
/// Instructions synthesized by the compiler itself (for example the copy
/// inserted by `materialize`) carry the hint of the construct that needed them,
/// or [`LocOffset::UNKNOWN`] when there is none.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LocOffset {
    /// Line number (1-indexed, 0 = unknown).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
}

impl LocOffset {
    /// Hint for instructions without a source position.
    pub const UNKNOWN: LocOffset = LocOffset { line: 0, col: 0 };

    /// Create a new position hint from a line and column.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Create a hint pointing at the start of a line.
    #[inline]
    pub fn line(line: u32) -> Self {
        Self { line, col: 1 }
    }

    /// Whether this hint carries no position.
    #[inline]
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for LocOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "?")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

impl fmt::Display for LocOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
