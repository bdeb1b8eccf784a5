//! Coordination event log ports.
//!
//! The engine only ever appends. Reading back is reserved for dashboards.

use std::future::Future;

use stovepanel_domain::coordination::CoordinationEvent;
use stovepanel_domain::error::PanelError;

/// Append-only sink for coordination decisions.
pub trait CoordinationEventSink: Send + Sync {
    fn append(&self, event: CoordinationEvent) -> impl Future<Output = Result<(), PanelError>> + Send;
}

/// Read side of the event log, newest first.
pub trait CoordinationEventReader: Send + Sync {
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CoordinationEvent>, PanelError>> + Send;
}
