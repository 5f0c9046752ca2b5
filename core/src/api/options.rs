//! Configuration options for the plea engine.

use crate::vm::VmOptions;

/// Configuration options for the plea engine.
///
/// # Example
///
/// ```
/// use plea_core::api::EngineOptions;
/// use plea_core::vm::VmOptions;
///
/// let options = EngineOptions {
///     vm: VmOptions {
///         max_depth: 64,
///         ..VmOptions::default()
///     },
/// };
/// assert_eq!(options.vm.frame_size, 256);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Limits applied to every program run by the engine.
    pub vm: VmOptions,
}
