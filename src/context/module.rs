//! The per-module execution context.

use super::ExecutionState;
use crate::cancellation::CancellationToken;
use crate::config::{LogLevel, Settings};
use crate::core::{ContentProvider, DocumentBatch};
use crate::errors::EngineError;
use crate::events::EventBus;
use crate::fs::FileSystem;
use crate::graph::PhaseKind;
use crate::modules::Module;
use std::sync::Arc;
use uuid::Uuid;

/// The view of engine state passed to each module invocation.
///
/// Contexts are cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ModuleContext {
    state: Arc<ExecutionState>,
    bus: Arc<EventBus>,
    pipeline: String,
    phase: PhaseKind,
    inputs: DocumentBatch,
}

impl ModuleContext {
    pub(crate) fn new(
        state: Arc<ExecutionState>,
        bus: Arc<EventBus>,
        pipeline: String,
        phase: PhaseKind,
        inputs: DocumentBatch,
    ) -> Self {
        Self {
            state,
            bus,
            pipeline,
            phase,
            inputs,
        }
    }

    /// The current input batch.
    #[must_use]
    pub fn inputs(&self) -> &DocumentBatch {
        &self.inputs
    }

    /// The owning pipeline's display name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline
    }

    /// The executing phase.
    #[must_use]
    pub fn phase(&self) -> PhaseKind {
        self.phase
    }

    /// The execution id.
    #[must_use]
    pub fn execution_id(&self) -> Uuid {
        self.state.execution_id()
    }

    /// The engine settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        self.state.settings()
    }

    /// The file system.
    #[must_use]
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        self.state.file_system()
    }

    /// The cancellation token.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        self.state.token()
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// The outputs of another pipeline's most recently completed phase.
    ///
    /// Cross-pipeline outputs are only guaranteed complete for declared
    /// dependencies, and only from the Process phase onward.
    #[must_use]
    pub fn outputs(&self, pipeline: &str) -> Option<DocumentBatch> {
        self.state
            .latest_outputs(&crate::pipeline::PipelineCollection::key_for(pipeline))
    }

    /// Emits a log record that participates in the failure threshold.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.state.log(level, message);
    }

    /// Records a diagnostic against the current pipeline and phase, next
    /// to the results produced by registered analyzers.
    pub fn add_analyzer_result(&self, result: crate::core::AnalyzerResult) {
        let key = crate::pipeline::PipelineCollection::key_for(&self.pipeline);
        self.state
            .add_analyzer_results(&key, self.phase, std::iter::once(result));
    }

    /// Obtains a content provider for a string, honoring the
    /// `UseStringContentFiles` setting.
    pub async fn content_from_string(
        &self,
        text: &str,
    ) -> Result<Arc<dyn ContentProvider>, EngineError> {
        self.state.content_from_string(text).await
    }

    /// Runs a module list against an arbitrary batch, with this context's
    /// pipeline, phase, and cancellation token. Used by container modules
    /// to run nested chains.
    pub async fn execute_modules(
        &self,
        modules: &[Arc<dyn Module>],
        inputs: DocumentBatch,
    ) -> Result<DocumentBatch, EngineError> {
        crate::engine::execute_module_chain(
            &self.state,
            &self.bus,
            &self.pipeline,
            self.phase,
            modules,
            inputs,
        )
        .await
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("pipeline", &self.pipeline)
            .field("phase", &self.phase)
            .field("inputs", &self.inputs.len())
            .finish()
    }
}
