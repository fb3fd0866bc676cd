//! Where tickets and ownership data come from.
//!
//! A [`TicketSource`] produces the raw ticket list consumed by ingestion; an
//! [`OwnershipDirectory`] answers AIT-number lookups for the ownership stage.

mod json;
mod types;

pub use json::{JsonOwnershipDirectory, JsonTicketSource};
pub use types::{OwnershipRecord, TicketRecord};

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

use crate::ticket::Ticket;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data in {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Produces the tickets to ingest.
#[async_trait]
pub trait TicketSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<Ticket>, SourceError>;
}

/// Resolves ownership details by AIT number.
#[async_trait]
pub trait OwnershipDirectory: Send + Sync {
    async fn lookup(&self, ait_number: &str) -> Result<Option<OwnershipRecord>, SourceError>;
}

/// In-memory ticket source.
#[derive(Default)]
pub struct StaticTicketSource {
    tickets: Mutex<Vec<Ticket>>,
}

impl StaticTicketSource {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets: Mutex::new(tickets),
        }
    }

    /// Replace the tickets returned by subsequent fetches.
    pub fn set(&self, tickets: Vec<Ticket>) {
        if let Ok(mut guard) = self.tickets.lock() {
            *guard = tickets;
        }
    }
}

#[async_trait]
impl TicketSource for StaticTicketSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> Result<Vec<Ticket>, SourceError> {
        self.tickets
            .lock()
            .map(|t| t.clone())
            .map_err(|_| SourceError::Unavailable("static source lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_returns_current_tickets() {
        let source = StaticTicketSource::new(vec![Ticket::new("T1", "IAM", "a")]);
        assert_eq!(source.fetch().await.unwrap().len(), 1);

        source.set(vec![]);
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
