//! Virtual machine for compiled plea programs.
//!
//! The VM walks the byte stream of a [`crate::bytecode::Code`] with an operand
//! stack, a return-address stack, one frame of variable slots per active call,
//! an arena of arrays and a queue of deferred conditions polled after every
//! instruction.

mod error;
mod frames;
mod runtime;
mod stack;
mod value;
mod when_queue;

#[cfg(test)]
mod runtime_test;

pub use error::RuntimeError;
pub use runtime::{Outcome, Vm, VmOptions};
pub use value::{ArrayRef, Value};
