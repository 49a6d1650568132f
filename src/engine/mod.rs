//! The engine façade.
//!
//! This module provides:
//! - [`Engine`]: pipeline registration, execution, disposal
//! - [`ExecutionOutputs`]: everything an execution produced
//! - The phase scheduler and module-chain executor

mod executor;
mod scheduler;
mod summary;

#[cfg(test)]
mod integration_tests;

pub(crate) use executor::execute_module_chain;
pub use summary::{ExecutionSummary, SummaryRow};

use crate::analysis::{activate_analyzers, Analyzer};
use crate::cancellation::CancellationToken;
use crate::config::{CleanMode, LogLevel, Settings};
use crate::context::ExecutionState;
use crate::core::{DocumentBatch, PhaseResult};
use crate::errors::EngineError;
use crate::events::{AfterEngineExecution, BeforeEngineExecution, EventBus};
use crate::fs::{FileSystem, MemoryFileSystem};
use crate::graph::{build_phase_graph, PhaseGraph, PhaseKind};
use crate::pipeline::{ExecutionPolicy, Pipeline, PipelineCollection};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything one execution produced, keyed by pipeline display name in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOutputs {
    results: IndexMap<String, [Option<PhaseResult>; 4]>,
}

impl ExecutionOutputs {
    fn insert(&mut self, pipeline: String, results: [Option<PhaseResult>; 4]) {
        self.results.insert(pipeline, results);
    }

    /// A pipeline's four result slots, by case-insensitive name.
    #[must_use]
    pub fn get(&self, pipeline: &str) -> Option<&[Option<PhaseResult>; 4]> {
        self.results
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(pipeline))
            .map(|(_, results)| results)
    }

    /// A pipeline's result for one phase.
    #[must_use]
    pub fn phase_result(&self, pipeline: &str, kind: PhaseKind) -> Option<&PhaseResult> {
        self.get(pipeline)?[kind.index()].as_ref()
    }

    /// A pipeline's final (Output phase) documents.
    #[must_use]
    pub fn documents(&self, pipeline: &str) -> Option<&DocumentBatch> {
        self.phase_result(pipeline, PhaseKind::Output)
            .map(|r| &r.outputs)
    }

    /// Iterates `(pipeline, results)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<PhaseResult>; 4])> {
        self.results.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// The number of pipelines that were selected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no pipelines were selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// The pipeline execution engine.
///
/// Pipelines, analyzers, and event handlers are registered explicitly at
/// construction time; there is no service container or reflective
/// discovery. The phase graph is compiled lazily on the first `execute`
/// and reused until the pipeline collection mutates.
pub struct Engine {
    pipelines: PipelineCollection,
    settings: Settings,
    bus: Arc<EventBus>,
    fs: Arc<dyn FileSystem>,
    analyzers: Vec<Arc<dyn Analyzer>>,
    serial: bool,
    cached_graph: Mutex<Option<(u64, Arc<PhaseGraph>)>>,
    current_execution: Mutex<Option<Uuid>>,
    has_executed: AtomicBool,
    disposed: AtomicBool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an engine with default settings and an in-memory file
    /// system. Production callers supply a real file system through
    /// [`Engine::with_file_system`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: PipelineCollection::new(),
            settings: Settings::default(),
            bus: Arc::new(EventBus::new()),
            fs: Arc::new(MemoryFileSystem::new()),
            analyzers: Vec::new(),
            serial: false,
            cached_graph: Mutex::new(None),
            current_execution: Mutex::new(None),
            has_executed: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
        }
    }

    /// Sets the engine settings.
    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the file system.
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Registers an analyzer. Analyzers only run when activated through
    /// the `Analyzers` setting.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    /// Forces each phase task to be awaited before the next is scheduled.
    /// The dependency graph is still honored; concurrency drops to one
    /// in-flight phase.
    #[must_use]
    pub fn with_serial_execution(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    /// Registers a pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the name duplicates an existing pipeline.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) -> Result<(), EngineError> {
        self.pipelines.add(pipeline)?;
        Ok(())
    }

    /// The registered pipelines.
    #[must_use]
    pub fn pipelines(&self) -> &PipelineCollection {
        &self.pipelines
    }

    /// Mutable access to the pipeline collection. Mutations invalidate
    /// the cached phase graph for the next execution.
    pub fn pipelines_mut(&mut self) -> &mut PipelineCollection {
        &mut self.pipelines
    }

    /// The event bus; attach handlers here.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.bus
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

    /// The compiled phase graph, rebuilt only when the pipeline
    /// collection has mutated since the last build.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error in the declarations.
    pub fn phase_graph(&self) -> Result<Arc<PhaseGraph>, EngineError> {
        let version = self.pipelines.version();
        let mut cache = self.cached_graph.lock();
        if let Some((cached_version, graph)) = cache.as_ref() {
            if *cached_version == version {
                return Ok(graph.clone());
            }
        }
        let graph = Arc::new(build_phase_graph(&self.pipelines)?);
        *cache = Some((version, graph.clone()));
        Ok(graph)
    }

    /// Executes the selected pipelines.
    ///
    /// The selection starts from `pipelines` plus every `Always` pipeline,
    /// plus the `Normal` ones when `include_normal` is set, and is closed
    /// over declared dependencies. An empty `pipelines` list with
    /// `include_normal` runs everything that is not `Manual`.
    ///
    /// The summary and the `AfterEngineExecution` event run on every path,
    /// including failure and cancellation; the outputs map is fully
    /// populated with whatever succeeded before any error is returned.
    ///
    /// # Errors
    ///
    /// Configuration errors (unknown names, graph build) are returned
    /// before any phase runs. Phase failures are aggregated and returned
    /// after the run drains; a crossed failure-log threshold fails an
    /// otherwise successful run.
    pub async fn execute(
        &self,
        pipelines: &[&str],
        include_normal: bool,
        token: Arc<CancellationToken>,
    ) -> Result<ExecutionOutputs, EngineError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(EngineError::Disposed);
        }

        let execution_id = Uuid::new_v4();
        {
            let mut current = self.current_execution.lock();
            if let Some(running) = *current {
                return Err(EngineError::AlreadyExecuting(running));
            }
            *current = Some(execution_id);
        }

        let result = self
            .execute_inner(execution_id, pipelines, include_normal, token)
            .await;
        *self.current_execution.lock() = None;
        result
    }

    async fn execute_inner(
        &self,
        execution_id: Uuid,
        pipelines: &[&str],
        include_normal: bool,
        token: Arc<CancellationToken>,
    ) -> Result<ExecutionOutputs, EngineError> {
        let started = Instant::now();
        info!(%execution_id, "engine execution starting");

        if self.pipelines.is_empty() {
            warn!("no pipelines are registered; nothing to execute");
        }

        // Configuration work happens before any side effect so that a bad
        // declaration leaves no partial state.
        let graph = self.phase_graph()?;
        let selected = self.select(pipelines, include_normal)?;
        let activated = activate_analyzers(&self.analyzers, self.settings.analyzers())?;

        self.clean_before_execution().await?;

        let state = Arc::new(ExecutionState::new(
            execution_id,
            self.settings.clone(),
            self.fs.clone(),
            token,
        ));

        let mut before = BeforeEngineExecution { execution_id };
        self.bus.before_engine_execution().raise(&mut before).await?;

        let mut errors = scheduler::execute_graph(
            graph.clone(),
            selected.clone(),
            state.clone(),
            self.bus.clone(),
            Arc::new(activated),
            self.serial,
        )
        .await;

        // Populate the outputs with everything that succeeded, in
        // registration order, before deciding success or failure.
        let mut outputs = ExecutionOutputs::default();
        for (key, ids) in graph.pipelines() {
            if selected.contains(key) {
                let display = graph.phase(ids[0]).pipeline.clone();
                outputs.insert(display, state.pipeline_results(key));
            }
        }

        let summary = ExecutionSummary::build(&graph, &selected, &state);
        info!("execution summary:\n{}", summary.render());

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut after = AfterEngineExecution {
            execution_id,
            outputs: outputs.clone(),
            elapsed_ms,
        };
        if let Err(err) = self.bus.after_engine_execution().raise(&mut after).await {
            state.log(
                LogLevel::Error,
                format!("AfterEngineExecution handler failed: {err}"),
            );
            errors.push(err);
        }
        info!(%execution_id, elapsed_ms, "engine execution finished");

        if !errors.is_empty() {
            if errors.iter().all(EngineError::is_cancellation) {
                return Err(EngineError::Cancelled);
            }
            return Err(match errors.len() {
                1 => errors.remove(0),
                _ => EngineError::Aggregate { errors },
            });
        }

        let records = state.failure_records();
        if !records.is_empty() {
            return Err(EngineError::FailuresLogged {
                threshold: self.settings.failure_log_level(),
                records,
            });
        }

        Ok(outputs)
    }

    /// Resolves the effective pipeline selection: `Always` pipelines,
    /// `Normal` ones when requested, the explicitly named ones, and the
    /// transitive closure of their dependencies.
    fn select(
        &self,
        requested: &[&str],
        include_normal: bool,
    ) -> Result<HashSet<String>, EngineError> {
        let mut selected = HashSet::new();

        for (key, pipeline) in self.pipelines.iter() {
            match pipeline.effective_policy() {
                ExecutionPolicy::Always => {
                    selected.insert(key.to_string());
                }
                ExecutionPolicy::Normal if include_normal => {
                    selected.insert(key.to_string());
                }
                _ => {}
            }
        }

        for name in requested {
            if !self.pipelines.contains(name) {
                return Err(EngineError::UnknownPipeline((*name).to_string()));
            }
            selected.insert(PipelineCollection::key_for(name));
        }

        let mut stack: Vec<String> = selected.iter().cloned().collect();
        while let Some(key) = stack.pop() {
            if let Some(pipeline) = self.pipelines.get(&key) {
                for dependency in pipeline.dependencies() {
                    let dep_key = PipelineCollection::key_for(dependency);
                    if selected.insert(dep_key.clone()) {
                        stack.push(dep_key);
                    }
                }
            }
        }

        Ok(selected)
    }

    /// Applies the clean mode. The first execution always wipes the whole
    /// output directory; the temp directory is wiped every time.
    async fn clean_before_execution(&self) -> Result<(), EngineError> {
        let first = !self.has_executed.swap(true, Ordering::SeqCst);
        if first || self.settings.clean_mode() == CleanMode::Full {
            self.fs.clean_output().await?;
            self.fs.clear_written_files();
        } else if self.settings.clean_mode() == CleanMode::Written {
            for path in self.fs.written_files() {
                self.fs.delete(&path).await?;
            }
            self.fs.clear_written_files();
        }
        self.fs.clean_temp().await?;
        Ok(())
    }

    /// Tears the engine down: deletes what it wrote (or the whole output
    /// directory under `CleanMode::Full`), wipes temp, and marks the
    /// engine disposed. Every later operation returns
    /// [`EngineError::Disposed`].
    ///
    /// # Errors
    ///
    /// Returns an error when called twice or when cleanup IO fails.
    pub async fn dispose(&self) -> Result<(), EngineError> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Err(EngineError::Disposed);
        }

        if self.settings.clean_mode() == CleanMode::Full {
            self.fs.clean_output().await?;
        } else {
            for path in self.fs.written_files() {
                self.fs.delete(&path).await?;
            }
        }
        self.fs.clear_written_files();
        self.fs.clean_temp().await?;
        info!("engine disposed");
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("pipelines", &self.pipelines.len())
            .field("serial", &self.serial)
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}
