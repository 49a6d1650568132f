//! Engine events and the typed event bus.
//!
//! The bus keeps one ordered handler list per event kind. Handlers run
//! sequentially in registration order and may mutate the event args; the
//! module events use that to override module outputs.

mod args;
mod bus;

pub use args::{
    AfterEngineExecution, AfterModuleExecution, BeforeDeployment, BeforeEngineExecution,
    BeforeModuleExecution,
};
pub use bus::{EventBus, HandlerFuture, HandlerList};
