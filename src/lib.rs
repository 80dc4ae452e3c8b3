//! Bytecode IR and assembler for a Starlark-style interpreter.
//!
//! This crate re-exports the workspace crates under one name:
//!
//! - [`bcir_core`]: constant values, position hints and lowering errors
//! - [`bcir_compiler`]: the IR builder, lowering pass and final code
//!
//! ```
//! use bcir::prelude::*;
//!
//! let mut ir = BcIr::new();
//! ir.add(BcIrInstr::ret(LocOffset::line(1), Value::Int(5)));
//! assert_eq!(ir.returns_constant(), Some(&Value::Int(5)));
//!
//! let code = ir.write(WriteOptions::default()).unwrap();
//! code.assert_opcodes(&[Opcode::Return]);
//! ```

pub use bcir_compiler::{bytecode, emit, ir};
pub use bcir_core::{LocOffset, LoweringError, Value, WriteError};

// Re-export main types
pub mod prelude {
    pub use bcir_compiler::bytecode::{BcCode, JumpCond, Opcode};
    pub use bcir_compiler::emit::WriteOptions;
    pub use bcir_compiler::ir::{
        AnyLocal, BcIr, BcIrInstr, BcIrOperand, BcIrSlot, JumpLabel, LazyLocal, Local,
    };
    pub use bcir_core::{LocOffset, LoweringError, Value, WriteError};
}
