//! Ordered async handler lists keyed by event type.

use super::{
    AfterEngineExecution, AfterModuleExecution, BeforeDeployment, BeforeEngineExecution,
    BeforeModuleExecution,
};
use crate::errors::EngineError;
use parking_lot::RwLock;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The boxed future returned by an event handler.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send + 'a>>;

trait Handler<E>: Send + Sync {
    fn call<'a>(&'a self, args: &'a mut E) -> HandlerFuture<'a>;
}

struct AsyncHandler<F>(F);

impl<E, F> Handler<E> for AsyncHandler<F>
where
    F: for<'a> Fn(&'a mut E) -> HandlerFuture<'a> + Send + Sync,
{
    fn call<'a>(&'a self, args: &'a mut E) -> HandlerFuture<'a> {
        (self.0)(args)
    }
}

struct SyncHandler<F>(F);

impl<E, F> Handler<E> for SyncHandler<F>
where
    F: Fn(&mut E) -> Result<(), EngineError> + Send + Sync,
{
    fn call<'a>(&'a self, args: &'a mut E) -> HandlerFuture<'a> {
        let result = (self.0)(args);
        Box::pin(async move { result })
    }
}

/// An ordered list of handlers for one event kind.
pub struct HandlerList<E> {
    handlers: RwLock<Vec<Arc<dyn Handler<E>>>>,
}

impl<E> Default for HandlerList<E> {
    fn default() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }
}

impl<E: Send> HandlerList<E> {
    /// Registers an async handler. Handlers run in registration order.
    pub fn subscribe<F>(&self, handler: F)
    where
        F: for<'a> Fn(&'a mut E) -> HandlerFuture<'a> + Send + Sync + 'static,
        E: 'static,
    {
        self.handlers.write().push(Arc::new(AsyncHandler(handler)));
    }

    /// Registers a synchronous handler. Handlers run in registration
    /// order, interleaved with async handlers.
    pub fn subscribe_fn<F>(&self, handler: F)
    where
        F: Fn(&mut E) -> Result<(), EngineError> + Send + Sync + 'static,
        E: 'static,
    {
        self.handlers.write().push(Arc::new(SyncHandler(handler)));
    }

    /// Invokes the handlers sequentially in registration order, awaiting
    /// each. Returns `true` iff at least one handler was registered.
    ///
    /// # Errors
    ///
    /// A handler error aborts the raise; later handlers do not run.
    pub async fn raise(&self, args: &mut E) -> Result<bool, EngineError> {
        let snapshot: Vec<Arc<dyn Handler<E>>> = self.handlers.read().clone();
        if snapshot.is_empty() {
            return Ok(false);
        }
        for handler in snapshot {
            handler.call(args).await?;
        }
        Ok(true)
    }

    /// The number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    /// Whether no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<E> std::fmt::Debug for HandlerList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerList")
            .field("handlers", &self.handlers.read().len())
            .finish()
    }
}

/// The engine's event registry: one handler list per event kind.
#[derive(Debug, Default)]
pub struct EventBus {
    before_engine_execution: HandlerList<BeforeEngineExecution>,
    after_engine_execution: HandlerList<AfterEngineExecution>,
    before_deployment: HandlerList<BeforeDeployment>,
    before_module_execution: HandlerList<BeforeModuleExecution>,
    after_module_execution: HandlerList<AfterModuleExecution>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handlers raised at the start of every execution.
    #[must_use]
    pub fn before_engine_execution(&self) -> &HandlerList<BeforeEngineExecution> {
        &self.before_engine_execution
    }

    /// Handlers raised at the end of every execution.
    #[must_use]
    pub fn after_engine_execution(&self) -> &HandlerList<AfterEngineExecution> {
        &self.after_engine_execution
    }

    /// Handlers raised once all non-deployment work has drained.
    #[must_use]
    pub fn before_deployment(&self) -> &HandlerList<BeforeDeployment> {
        &self.before_deployment
    }

    /// Handlers raised before each module executes.
    #[must_use]
    pub fn before_module_execution(&self) -> &HandlerList<BeforeModuleExecution> {
        &self.before_module_execution
    }

    /// Handlers raised after each module executes.
    #[must_use]
    pub fn after_module_execution(&self) -> &HandlerList<AfterModuleExecution> {
        &self.after_module_execution
    }
}
