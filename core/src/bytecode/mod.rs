//! The compiled program: flat bytecode plus its side tables.
//!
//! The compiler produces a [`Code`] and the VM consumes it; nothing else is
//! shared between the two. The instruction stream is a byte buffer, decoded on
//! the fly by [`Code::decode`], with string operands embedded as NUL-terminated
//! runs.

mod code;
mod decode;
mod disasm;
mod opcode;


pub use code::{Code, Constant, ConstantPool, Function, FunctionTable};
pub use decode::{DecodeError, Instruction};
pub use opcode::{Obligation, Opcode, Polarity};
