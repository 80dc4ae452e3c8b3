//! Core types shared by the bytecode IR and assembler.
//!
//! - [`Value`]: compile-time constant values carried by IR operands
//! - [`LocOffset`]: source position hints attached to instructions
//! - [`LoweringError`] and [`WriteError`]: internal-consistency failures of the lowering pass

mod error;
mod loc;
mod value;

pub use error::{LoweringError, WriteError};
pub use loc::LocOffset;
pub use value::Value;
