//! Public API for the plea language.
//!
//! [`Engine`] compiles source text into a [`Code`](crate::bytecode::Code) and
//! runs it on the virtual machine. Errors from every layer are converted into
//! the single [`Error`] type here, with compile errors carried as
//! [`Diagnostic`]s ready for rendering.
//!
//! # Example
//!
//! ```
//! use plea_core::api::{Engine, EngineOptions};
//! use plea_core::gate::Lenient;
//!
//! let engine = Engine::new(EngineOptions::default());
//! let code = engine
//!     .compile("beg \"please run\"; fnctn returns 0 nm main args calls call print in 72 endin;")
//!     .unwrap();
//!
//! let mut output = Vec::new();
//! engine.run(&code, &mut Lenient, &b""[..], &mut output).unwrap();
//! assert_eq!(output, b"H");
//! ```

pub mod engine;
pub mod error;
pub mod options;

pub use engine::Engine;
pub use error::{Diagnostic, Error, Severity};
pub use options::EngineOptions;
