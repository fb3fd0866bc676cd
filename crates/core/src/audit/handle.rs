use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use super::AuditEvent;

/// A run-log event stamped at the moment it was emitted.
#[derive(Debug, Clone)]
pub struct AuditEventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

/// Sending side of the run log.
///
/// Clones share one bounded channel drained by the [`AuditWriter`](super::AuditWriter).
/// Emitting applies backpressure when the writer falls behind.
#[derive(Clone)]
pub struct AuditHandle {
    tx: mpsc::Sender<AuditEventEnvelope>,
}

impl AuditHandle {
    pub fn new(tx: mpsc::Sender<AuditEventEnvelope>) -> Self {
        Self { tx }
    }

    /// Record `event`. A stopped writer is logged and otherwise ignored, so
    /// pipeline progress never depends on the run log.
    pub async fn emit(&self, event: AuditEvent) {
        let event_type = event.event_type();
        let envelope = AuditEventEnvelope {
            timestamp: Utc::now(),
            event,
        };
        if self.tx.send(envelope).await.is_err() {
            warn!(event_type, "Run log writer stopped, dropping event");
        }
    }
}
