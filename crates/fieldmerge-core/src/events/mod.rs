//! Run lifecycle events.
//!
//! Synchronous dispatch to registered handlers; zero overhead when no
//! handler is registered. Handlers observe group progress without being
//! able to affect pipeline control flow.

pub mod dispatcher;
pub mod handler;
pub mod types;

pub use dispatcher::EventDispatcher;
pub use handler::RunEventHandler;
pub use types::{
    GroupCompletedEvent, GroupFailedEvent, GroupSkippedEvent, GroupStartedEvent,
    RunCompletedEvent, RunStartedEvent, SkipReason,
};
