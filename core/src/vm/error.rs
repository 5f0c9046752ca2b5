use thiserror::Error;

use crate::bytecode::DecodeError;
use crate::gate::Rejection;

/// Fatal errors raised while running a program. None of them are recoverable;
/// execution stops at the first one.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("programmer has insufficiently begged")]
    InsufficientlyBegged,

    #[error("programmer has insufficiently begged: {0}")]
    GateRejected(#[from] Rejection),

    #[error("the scope is too deep")]
    ScopeTooDeep,

    #[error("you promised :( (`{function}` returned before its promise was kept)")]
    BrokenPromise { function: String },

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("operand stack overflow")]
    StackOverflow,

    #[error("operand stack underflow")]
    StackUnderflow,

    #[error("return stack overflow")]
    ReturnStackOverflow,

    #[error("return stack underflow")]
    ReturnStackUnderflow,

    #[error("value is not an array")]
    NotAnArray,

    #[error("index {index} is out of bounds for an array of length {len}")]
    IndexOutOfBounds { index: i32, len: usize },

    #[error("invalid array length {0}")]
    InvalidLength(i32),

    #[error("statement {0} does not exist")]
    LineOutOfRange(i32),

    #[error("constant #{0} does not exist")]
    UnknownConstant(u8),

    #[error("invalid operand: {0}")]
    InvalidOperand(&'static str),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
