//! The plea compilation and execution engine.

use std::io::{BufRead, Write};

use tracing::debug;

use super::{EngineOptions, Error};
use crate::bytecode::Code;
use crate::compiler;
use crate::gate::Gate;
use crate::vm::{Outcome, Vm};

/// Compiles plea programs and runs them with a fixed set of VM limits.
///
/// A compiled [`Code`] does not borrow the source or the engine, so it can be
/// run any number of times, each run starting from a fresh machine.
///
/// # Example
///
/// ```
/// use plea_core::api::{Engine, EngineOptions, Error};
/// use plea_core::gate::Lenient;
/// use plea_core::vm::{RuntimeError, Value};
///
/// let engine = Engine::new(EngineOptions::default());
///
/// let code = engine.compile("beg \"hi there\"; fnctn returns 42 nm main args calls ;").unwrap();
/// let outcome = engine.run(&code, &mut Lenient, &b""[..], Vec::new()).unwrap();
/// assert_eq!(outcome.value, Some(Value::Int(42)));
///
/// // Without a greeting the program never starts.
/// let code = engine.compile("fnctn returns 42 nm main args calls ;").unwrap();
/// let err = engine.run(&code, &mut Lenient, &b""[..], Vec::new()).unwrap_err();
/// assert!(matches!(err, Error::Runtime(RuntimeError::InsufficientlyBegged)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compile a whole program.
    ///
    /// On failure the error carries one diagnostic for the first problem
    /// found, plus the source it points into.
    pub fn compile(&self, source: &str) -> Result<Code, Error> {
        compiler::compile(source).map_err(|err| {
            debug!(error = %err, "compilation failed");
            Error::compilation(err, source)
        })
    }

    /// Run a compiled program to completion.
    ///
    /// The greeting is judged by `gate`. `print` writes to `output`, and
    /// `input` reads lines from `input`.
    pub fn run<I: BufRead, O: Write>(
        &self,
        code: &Code,
        gate: &mut dyn Gate,
        input: I,
        output: O,
    ) -> Result<Outcome, Error> {
        let outcome = Vm::new(code, self.options.vm, gate, input, output).run()?;
        debug!(arrays_released = outcome.arrays_released, "program halted");
        Ok(outcome)
    }
}
