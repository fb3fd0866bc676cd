use std::sync::Arc;

use tokio::sync::mpsc;

use super::{AuditEventEnvelope, AuditHandle, AuditRecord, AuditStore};

/// Background task that receives run-log events and writes them to storage
pub struct AuditWriter {
    rx: mpsc::Receiver<AuditEventEnvelope>,
    store: Arc<dyn AuditStore>,
}

impl AuditWriter {
    pub fn new(rx: mpsc::Receiver<AuditEventEnvelope>, store: Arc<dyn AuditStore>) -> Self {
        Self { rx, store }
    }

    /// Run the writer, consuming events until every handle is dropped.
    pub async fn run(mut self) {
        tracing::info!("Audit writer started");

        while let Some(envelope) = self.rx.recv().await {
            let record = AuditRecord {
                id: 0,
                timestamp: envelope.timestamp,
                event_type: envelope.event.event_type().to_string(),
                ticket_id: envelope.event.ticket_id().map(String::from),
                message: envelope.event.message(),
                data: envelope.event,
            };
            tracing::debug!(event_type = %record.event_type, "{}", record.message);

            if let Err(e) = self.store.insert(&record) {
                tracing::error!("Failed to write audit event: {}", e);
            }
        }

        tracing::info!("Audit writer shutting down");
    }
}

/// Create a complete run-log system
///
/// Returns the `AuditHandle` to clone into components and the `AuditWriter`
/// to spawn with `tokio::spawn(writer.run())`.
pub fn create_audit_system(
    store: Arc<dyn AuditStore>,
    buffer_size: usize,
) -> (AuditHandle, AuditWriter) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let handle = AuditHandle::new(tx);
    let writer = AuditWriter::new(rx, store);
    (handle, writer)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audit::{AuditError, AuditEvent, AuditFilter, InMemoryAuditStore};
    use crate::ticket::StageKind;

    /// Store that always fails inserts
    struct FailingStore {
        attempts: Mutex<usize>,
    }

    impl AuditStore for FailingStore {
        fn insert(&self, _record: &AuditRecord) -> Result<i64, AuditError> {
            *self.attempts.lock().unwrap() += 1;
            Err(AuditError::Storage("Mock failure".to_string()))
        }

        fn query(&self, _filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
            Ok(vec![])
        }

        fn count(&self, _filter: &AuditFilter) -> Result<usize, AuditError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_writer_receives_and_stores_events() {
        let store = Arc::new(InMemoryAuditStore::new());
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_handle = tokio::spawn(writer.run());

        handle
            .emit(AuditEvent::StageRejected {
                ticket_id: "ticket-123".to_string(),
                stage: StageKind::OwnerSpaceCheck,
                reason: "Owner space Other-Space is not allowed".to_string(),
            })
            .await;

        drop(handle);
        writer_handle.await.unwrap();

        let records = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "stage_rejected");
        assert_eq!(records[0].ticket_id, Some("ticket-123".to_string()));
        assert!(records[0].message.contains("App Owner Check rejected"));
    }

    #[tokio::test]
    async fn test_writer_continues_on_insert_failure() {
        let store = Arc::new(FailingStore {
            attempts: Mutex::new(0),
        });
        let (handle, writer) = create_audit_system(store.clone(), 10);
        let writer_handle = tokio::spawn(writer.run());

        for _ in 0..3 {
            handle
                .emit(AuditEvent::ServiceStopped {
                    reason: "test".to_string(),
                })
                .await;
        }

        drop(handle);
        writer_handle.await.unwrap();
        assert_eq!(*store.attempts.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_writer_waits_for_all_handles_to_drop() {
        let store = Arc::new(InMemoryAuditStore::new());
        let (main_handle, writer) = create_audit_system(store.clone(), 10);
        let engine_handle = main_handle.clone();

        let writer_handle = tokio::spawn(writer.run());

        engine_handle
            .emit(AuditEvent::PipelineCompleted {
                ticket_id: "t-1".to_string(),
            })
            .await;
        main_handle
            .emit(AuditEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            })
            .await;

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        drop(main_handle);
        assert!(
            !writer_handle.is_finished(),
            "Writer should still be running with handles alive"
        );

        drop(engine_handle);
        let result = tokio::time::timeout(tokio::time::Duration::from_secs(1), writer_handle).await;
        assert!(result.is_ok(), "Writer should exit after all handles dropped");

        let records = store.query(&AuditFilter::new()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_type, "pipeline_completed");
        assert_eq!(records[1].event_type, "service_stopped");
    }
}
