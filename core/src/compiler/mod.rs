//! Compiler from plea source text to [`crate::bytecode::Code`].
//!
//! ## Design
//!
//! - Single pass over the token stream, no syntax tree
//! - Literals that fit in a byte are inlined, the rest go to the constant pool
//! - Forward calls and forward jumps are recorded and checked once their
//!   target is known
//! - `catch error` rolls a failed statement back and compiles the rest

mod bytecode;
mod error;
mod expr;


pub use bytecode::{BytecodeCompiler, INPUT, MAIN, PRINT};
pub use error::{CompileError, CompileErrorKind};

use crate::bytecode::Code;

/// Lex and compile a whole program.
pub fn compile(source: &str) -> Result<Code, CompileError> {
    BytecodeCompiler::compile(source)
}
