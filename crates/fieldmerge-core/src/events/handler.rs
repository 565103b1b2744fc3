//! Handler trait for run lifecycle events.

use super::types::*;

/// Observer of run lifecycle events. All methods default to no-ops so
/// handlers implement only what they care about.
pub trait RunEventHandler: Send + Sync {
    fn on_run_started(&self, _event: &RunStartedEvent) {}
    fn on_group_started(&self, _event: &GroupStartedEvent) {}
    fn on_group_completed(&self, _event: &GroupCompletedEvent) {}
    fn on_group_skipped(&self, _event: &GroupSkippedEvent) {}
    fn on_group_failed(&self, _event: &GroupFailedEvent) {}
    fn on_run_completed(&self, _event: &RunCompletedEvent) {}
}
