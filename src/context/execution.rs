//! Engine-wide state for one execution.

use crate::cancellation::CancellationToken;
use crate::config::{LogLevel, LogRecord, Settings};
use crate::core::{AnalyzerResult, ContentProvider, DocumentBatch, FileContent, PhaseResult, StringContent};
use crate::errors::EngineError;
use crate::fs::FileSystem;
use crate::graph::PhaseKind;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// The shared state of one engine execution.
///
/// Created per `execute` call and threaded through every phase task and
/// module context. The result maps are concurrent: each phase task writes
/// only its own pipeline's slots.
pub struct ExecutionState {
    execution_id: Uuid,
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    token: Arc<CancellationToken>,
    phase_results: DashMap<String, [Option<PhaseResult>; 4]>,
    analyzer_results: DashMap<(String, PhaseKind), Vec<AnalyzerResult>>,
    failure_records: Mutex<Vec<LogRecord>>,
}

impl ExecutionState {
    /// Creates the state for one execution.
    #[must_use]
    pub fn new(
        execution_id: Uuid,
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        token: Arc<CancellationToken>,
    ) -> Self {
        Self {
            execution_id,
            settings,
            fs,
            token,
            phase_results: DashMap::new(),
            analyzer_results: DashMap::new(),
            failure_records: Mutex::new(Vec::new()),
        }
    }

    /// The execution id.
    #[must_use]
    pub fn execution_id(&self) -> Uuid {
        self.execution_id
    }

    /// The engine settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The file system.
    #[must_use]
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// The cancellation token.
    #[must_use]
    pub fn token(&self) -> &Arc<CancellationToken> {
        &self.token
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Emits a log record through `tracing` and, when the record meets the
    /// `FailureLogLevel` threshold, captures it so the execution fails
    /// after completion.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Trace => tracing::trace!("{message}"),
            LogLevel::Debug => tracing::debug!("{message}"),
            LogLevel::Information => tracing::info!("{message}"),
            LogLevel::Warning => tracing::warn!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
            LogLevel::None => return,
        }

        let threshold = self.settings.failure_log_level();
        if threshold != LogLevel::None && level >= threshold {
            self.failure_records.lock().push(LogRecord { level, message });
        }
    }

    /// The captured failure records.
    #[must_use]
    pub fn failure_records(&self) -> Vec<LogRecord> {
        self.failure_records.lock().clone()
    }

    /// Stores a phase result. Called once per successful phase.
    pub fn store_phase_result(&self, key: &str, result: PhaseResult) {
        let mut entry = self
            .phase_results
            .entry(key.to_string())
            .or_insert_with(|| [None, None, None, None]);
        let idx = result.kind.index();
        entry[idx] = Some(result);
    }

    /// A pipeline's result for one phase.
    #[must_use]
    pub fn phase_result(&self, key: &str, kind: PhaseKind) -> Option<PhaseResult> {
        self.phase_results
            .get(key)
            .and_then(|slots| slots[kind.index()].clone())
    }

    /// A pipeline's output batch for one phase.
    #[must_use]
    pub fn phase_outputs(&self, key: &str, kind: PhaseKind) -> Option<DocumentBatch> {
        self.phase_result(key, kind).map(|r| r.outputs)
    }

    /// A pipeline's four result slots.
    #[must_use]
    pub fn pipeline_results(&self, key: &str) -> [Option<PhaseResult>; 4] {
        self.phase_results
            .get(key)
            .map(|slots| slots.value().clone())
            .unwrap_or([None, None, None, None])
    }

    /// The outputs of a pipeline's most recently completed phase.
    #[must_use]
    pub fn latest_outputs(&self, key: &str) -> Option<DocumentBatch> {
        let slots = self.phase_results.get(key)?;
        slots
            .iter()
            .rev()
            .find_map(|slot| slot.as_ref().map(|r| r.outputs.clone()))
    }

    /// Appends analyzer results for a phase.
    pub fn add_analyzer_results(
        &self,
        key: &str,
        phase: PhaseKind,
        results: impl IntoIterator<Item = AnalyzerResult>,
    ) {
        self.analyzer_results
            .entry((key.to_string(), phase))
            .or_default()
            .extend(results);
    }

    /// A snapshot of all analyzer results.
    #[must_use]
    pub fn analyzer_results(&self) -> Vec<((String, PhaseKind), Vec<AnalyzerResult>)> {
        self.analyzer_results
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Obtains a content provider for a string, honoring the
    /// `UseStringContentFiles` setting by spilling to a temp file.
    pub async fn content_from_string(
        &self,
        text: &str,
    ) -> Result<Arc<dyn ContentProvider>, EngineError> {
        if self.settings.use_string_content_files() {
            let path = self.fs.write_temp(text.as_bytes()).await?;
            Ok(Arc::new(FileContent::new(path)))
        } else {
            Ok(Arc::new(StringContent::new(text)))
        }
    }
}

impl std::fmt::Debug for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionState")
            .field("execution_id", &self.execution_id)
            .field("pipelines", &self.phase_results.len())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
