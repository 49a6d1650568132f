//! Event argument records.

use crate::core::DocumentBatch;
use crate::engine::ExecutionOutputs;
use crate::graph::PhaseKind;
use uuid::Uuid;

/// Raised once at the start of every execution, before any phase runs.
#[derive(Debug, Clone)]
pub struct BeforeEngineExecution {
    /// The execution id.
    pub execution_id: Uuid,
}

/// Raised once at the end of every execution, after the summary - even
/// when the execution failed or was cancelled.
#[derive(Debug, Clone)]
pub struct AfterEngineExecution {
    /// The execution id.
    pub execution_id: Uuid,
    /// Everything that completed, keyed by pipeline name.
    pub outputs: ExecutionOutputs,
    /// Total execution time in milliseconds.
    pub elapsed_ms: f64,
}

/// Raised once all non-deployment phase tasks have completed and before
/// any deployment pipeline's Input phase starts. Raised even when the
/// execution contains no deployment pipelines.
#[derive(Debug, Clone)]
pub struct BeforeDeployment {
    /// The execution id.
    pub execution_id: Uuid,
}

/// Raised before each module executes.
///
/// Setting [`BeforeModuleExecution::overridden_outputs`] suppresses the
/// module's own execution and uses the supplied batch instead.
#[derive(Debug, Clone)]
pub struct BeforeModuleExecution {
    /// The owning pipeline.
    pub pipeline: String,
    /// The executing phase.
    pub phase: PhaseKind,
    /// The module about to run.
    pub module: String,
    /// The batch the module would receive.
    pub inputs: DocumentBatch,
    /// When set by a handler, used instead of running the module.
    pub overridden_outputs: Option<DocumentBatch>,
}

/// Raised after each module executes (or was overridden).
///
/// Setting [`AfterModuleExecution::overridden_outputs`] replaces the
/// module's outputs before they flow to the next module.
#[derive(Debug, Clone)]
pub struct AfterModuleExecution {
    /// The owning pipeline.
    pub pipeline: String,
    /// The executing phase.
    pub phase: PhaseKind,
    /// The module that ran.
    pub module: String,
    /// The module's outputs.
    pub outputs: DocumentBatch,
    /// The module's execution time in milliseconds.
    pub elapsed_ms: f64,
    /// When set by a handler, replaces the module's outputs.
    pub overridden_outputs: Option<DocumentBatch>,
}
