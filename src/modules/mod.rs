//! Module trait and basic implementations.
//!
//! Modules are the user-supplied units of work in a pipeline. Each phase of
//! a pipeline holds an ordered list of modules; the engine streams a
//! document batch through the list, feeding each module's output to the
//! next.

mod containers;

pub use containers::{ExecuteIf, ForEachDocument};

use crate::context::ModuleContext;
use crate::core::DocumentBatch;
use crate::errors::EngineError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline modules.
///
/// A module receives the current batch through [`ModuleContext::inputs`]
/// and returns the batch for the next module. Returning an empty batch is
/// normal; returning an error aborts the enclosing phase.
#[async_trait]
pub trait Module: Send + Sync + Debug {
    /// Returns the module name, used only for logging. Conventionally the
    /// type name.
    fn name(&self) -> &str;

    /// Executes the module against the context's input batch.
    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError>;
}

/// A module that passes its inputs through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpModule;

impl NoOpModule {
    /// Creates a no-op module.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for NoOpModule {
    fn name(&self) -> &str {
        "NoOpModule"
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        Ok(ctx.inputs().clone())
    }
}

/// A module backed by a plain function over the input batch.
pub struct FnModule<F>
where
    F: Fn(&ModuleContext) -> Result<DocumentBatch, EngineError> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnModule<F>
where
    F: Fn(&ModuleContext) -> Result<DocumentBatch, EngineError> + Send + Sync,
{
    /// Creates a function-based module.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnModule<F>
where
    F: Fn(&ModuleContext) -> Result<DocumentBatch, EngineError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModule").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> Module for FnModule<F>
where
    F: Fn(&ModuleContext) -> Result<DocumentBatch, EngineError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &ModuleContext) -> Result<DocumentBatch, EngineError> {
        (self.func)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Document;
    use crate::testing::module_context;

    #[tokio::test]
    async fn noop_passes_inputs_through() {
        let inputs = DocumentBatch::single(Document::new().with_destination("a.txt"));
        let ctx = module_context(inputs.clone());

        let outputs = NoOpModule::new().execute(&ctx).await.unwrap();
        assert_eq!(outputs.len(), 1);
        assert!(outputs.get(0).unwrap().same_identity(inputs.get(0).unwrap()));
    }

    #[tokio::test]
    async fn fn_module_runs_closure() {
        let module = FnModule::new("Drop", |_ctx| Ok(DocumentBatch::empty()));
        let ctx = module_context(DocumentBatch::single(Document::new()));

        assert_eq!(module.name(), "Drop");
        let outputs = module.execute(&ctx).await.unwrap();
        assert!(outputs.is_empty());
    }
}
