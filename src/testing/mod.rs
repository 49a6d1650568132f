//! Testing utilities: mock modules and context fixtures.

use crate::cancellation::CancellationToken;
use crate::config::Settings;
use crate::context::{ExecutionState, ModuleContext};
use crate::core::{Document, DocumentBatch};
use crate::errors::EngineError;
use crate::events::EventBus;
use crate::fs::MemoryFileSystem;
use crate::graph::PhaseKind;
use crate::modules::Module;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Builds a standalone module context over an in-memory file system, for
/// unit-testing modules outside an engine.
#[must_use]
pub fn module_context(inputs: DocumentBatch) -> ModuleContext {
    let state = Arc::new(ExecutionState::new(
        Uuid::new_v4(),
        Settings::default(),
        Arc::new(MemoryFileSystem::new()),
        Arc::new(CancellationToken::new()),
    ));
    ModuleContext::new(
        state,
        Arc::new(EventBus::new()),
        "test".to_string(),
        PhaseKind::Process,
        inputs,
    )
}

/// Emits fixed documents, replacing its inputs.
#[derive(Debug)]
pub struct EmitDocuments {
    docs: Vec<Document>,
}

impl EmitDocuments {
    /// Creates the module with the documents to emit.
    #[must_use]
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Emits a single document with the given destination and string
    /// content stored as metadata.
    #[must_use]
    pub fn one(destination: &str, content: &str) -> Self {
        Self::new(vec![Document::new()
            .with_destination(destination)
            .with_metadata("content", serde_json::json!(content))])
    }
}

#[async_trait]
impl Module for EmitDocuments {
    fn name(&self) -> &str {
        "EmitDocuments"
    }

    async fn execute(&self, _ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        Ok(self.docs.clone().into())
    }
}

/// Passes inputs through and counts invocations.
#[derive(Debug, Default)]
pub struct CountingModule {
    calls: AtomicUsize,
}

impl CountingModule {
    /// Creates the module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times the module executed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Module for CountingModule {
    fn name(&self) -> &str {
        "CountingModule"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ctx.inputs().clone())
    }
}

/// Always fails with the configured message.
#[derive(Debug)]
pub struct FailingModule {
    message: String,
}

impl FailingModule {
    /// Creates the module.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Module for FailingModule {
    fn name(&self) -> &str {
        "FailingModule"
    }

    async fn execute(&self, _ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        Err(EngineError::execution(self.message.clone()))
    }
}

/// Sleeps for the configured duration, racing the cancellation token.
#[derive(Debug)]
pub struct SleepingModule {
    duration: Duration,
}

impl SleepingModule {
    /// Creates the module.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Module for SleepingModule {
    fn name(&self) -> &str {
        "SleepingModule"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        let token = ctx.token().clone();
        tokio::select! {
            () = tokio::time::sleep(self.duration) => Ok(ctx.inputs().clone()),
            () = token.cancelled() => Err(EngineError::Cancelled),
        }
    }
}

/// Emits one document whose metadata records how many documents another
/// pipeline has produced so far.
#[derive(Debug)]
pub struct RecordPriorOutputs {
    source: String,
    key: String,
}

impl RecordPriorOutputs {
    /// Creates the module; `source` is the observed pipeline, `key` the
    /// metadata key to record the count under.
    #[must_use]
    pub fn new(source: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl Module for RecordPriorOutputs {
    fn name(&self) -> &str {
        "RecordPriorOutputs"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        let count = ctx.outputs(&self.source).map_or(0, |batch| batch.len());
        Ok(DocumentBatch::single(
            Document::new().with_metadata(&self.key, serde_json::json!(count)),
        ))
    }
}
