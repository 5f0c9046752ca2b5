//! plea - a language that has to be asked nicely
//!
//! # Overview
//!
//! A plea program opens with a greeting (`beg "..."`) and is made of functions
//! whose statements are chained with `then`. Statements may carry deferred
//! conditions (`when x is 3`) that send control back to the following
//! statement once they hold, and a function that returns with an unkept
//! promise is a fatal error.
//!
//! # Quick Start
//!
//! ```
//! use plea::{Engine, EngineOptions};
//! use plea::gate::Lenient;
//!
//! let engine = Engine::new(EngineOptions::default());
//! let code = engine
//!     .compile("beg \"please, oh great program\"; fnctn returns 0 nm main args calls let s = \"hi\" then call print in s endin;")
//!     .unwrap();
//!
//! let mut output = Vec::new();
//! engine.run(&code, &mut Lenient, &b""[..], &mut output).unwrap();
//! assert_eq!(output, b"hi");
//! ```
//!
//! Compile errors can be rendered against their source with
//! [`render_error`] and its variants.

// Re-export public API from plea_core
pub use plea_core::api::{Diagnostic, Engine, EngineOptions, Error, Severity};

pub use plea_core::bytecode::{self, Code};
pub use plea_core::gate::{self, Gate};
pub use plea_core::vm::{self, Outcome, RuntimeError, Value, VmOptions};

mod error_renderer;
pub use error_renderer::{
    render_error, render_error_to, render_error_to_string, render_error_to_string_no_color,
};
