//! Compiler and virtual machine for the plea language.
//!
//! A program goes through [`lexer`] and [`compiler`] into a flat
//! [`bytecode::Code`], which the [`vm`] runs after the [`gate`] has accepted
//! its greeting. [`api`] wraps the whole pipeline.

pub mod api;
pub mod bytecode;
pub mod compiler;
pub mod gate;
pub mod lexer;
pub mod types;
pub mod vm;

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_when_fires() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
