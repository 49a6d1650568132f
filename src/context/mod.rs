//! Execution state and per-module contexts.
//!
//! [`ExecutionState`] is the engine-wide state of one execution: settings,
//! file system, result maps, the failure-log counter, and the cancellation
//! token. [`ModuleContext`] is the narrow per-module view handed to each
//! module invocation.

mod execution;
mod module;

pub use execution::ExecutionState;
pub use module::ModuleContext;
