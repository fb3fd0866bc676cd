use thiserror::Error;

use super::AuditRecord;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Filter for querying run-log records
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub ticket_id: Option<String>,
    pub event_type: Option<String>,
    /// Most recent N records; 0 means no limit.
    pub limit: usize,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    pub fn with_ticket_id(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn with_event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(id) = &self.ticket_id {
            if record.ticket_id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if &record.event_type != event_type {
                return false;
            }
        }
        true
    }
}

/// Trait for run-log storage
pub trait AuditStore: Send + Sync {
    /// Insert a record, returns the assigned ID
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError>;

    /// Query records in chronological order
    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError>;

    /// Count matching records (ignores `limit`)
    fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError>;
}
