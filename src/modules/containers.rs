//! Container modules that run nested module lists.
//!
//! Containers exercise the re-entrant module chain helper on the context;
//! the children run with the same pipeline, phase, and cancellation token
//! as the container itself.

use super::Module;
use crate::context::ModuleContext;
use crate::core::DocumentBatch;
use crate::errors::EngineError;
use async_trait::async_trait;
use std::sync::Arc;

/// Runs its children once per input document, each time with a
/// single-document batch, and concatenates the results in input order.
#[derive(Debug)]
pub struct ForEachDocument {
    children: Vec<Arc<dyn Module>>,
}

impl ForEachDocument {
    /// Creates the container with its child modules.
    #[must_use]
    pub fn new(children: Vec<Arc<dyn Module>>) -> Self {
        Self { children }
    }
}

#[async_trait]
impl Module for ForEachDocument {
    fn name(&self) -> &str {
        "ForEachDocument"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        let mut combined = DocumentBatch::empty();
        for doc in ctx.inputs() {
            let outputs = ctx
                .execute_modules(&self.children, DocumentBatch::single(doc.clone()))
                .await?;
            combined = combined.concat(&outputs);
        }
        Ok(combined)
    }
}

/// Runs its children only when at least one input document carries the
/// configured metadata key; otherwise passes the batch through unchanged.
#[derive(Debug)]
pub struct ExecuteIf {
    key: String,
    children: Vec<Arc<dyn Module>>,
}

impl ExecuteIf {
    /// Creates the container gated on `key`.
    #[must_use]
    pub fn new(key: impl Into<String>, children: Vec<Arc<dyn Module>>) -> Self {
        Self {
            key: key.into(),
            children,
        }
    }
}

#[async_trait]
impl Module for ExecuteIf {
    fn name(&self) -> &str {
        "ExecuteIf"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        let matched = ctx.inputs().iter().any(|doc| doc.get(&self.key).is_some());
        if matched {
            ctx.execute_modules(&self.children, ctx.inputs().clone()).await
        } else {
            Ok(ctx.inputs().clone())
        }
    }
}
