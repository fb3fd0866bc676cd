//! JSON-file backed sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{OwnershipDirectory, OwnershipRecord, SourceError, TicketRecord, TicketSource};
use crate::ticket::Ticket;

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SourceError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_slice(&bytes).map_err(|e| SourceError::Malformed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Reads tickets from a JSON array on every fetch.
pub struct JsonTicketSource {
    path: PathBuf,
    ownership: Option<JsonOwnershipDirectory>,
}

impl JsonTicketSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ownership: None,
        }
    }

    /// Join each fetched ticket with its ownership record at load time.
    /// Tickets without a matching record are kept unenriched.
    pub fn with_ownership(mut self, directory: JsonOwnershipDirectory) -> Self {
        self.ownership = Some(directory);
        self
    }
}

#[async_trait]
impl TicketSource for JsonTicketSource {
    fn name(&self) -> &str {
        "json"
    }

    async fn fetch(&self) -> Result<Vec<Ticket>, SourceError> {
        let records: Vec<TicketRecord> = read_json_array(&self.path).await?;
        debug!(path = %self.path.display(), count = records.len(), "Read ticket records");

        let mut tickets: Vec<Ticket> = records.into_iter().map(Ticket::from).collect();
        if let Some(directory) = &self.ownership {
            for ticket in &mut tickets {
                if let Some(record) = ticket
                    .ait_number
                    .as_deref()
                    .and_then(|ait| directory.get(ait))
                {
                    record.apply_to(ticket);
                }
            }
        }
        Ok(tickets)
    }
}

/// Ownership records loaded once from a JSON array.
#[derive(Debug, Clone, Default)]
pub struct JsonOwnershipDirectory {
    records: HashMap<String, OwnershipRecord>,
}

impl JsonOwnershipDirectory {
    pub async fn load(path: &Path) -> Result<Self, SourceError> {
        let records: Vec<OwnershipRecord> = read_json_array(path).await?;
        debug!(path = %path.display(), count = records.len(), "Loaded ownership records");
        Ok(Self::from_records(records))
    }

    /// First record wins when an AIT number repeats.
    pub fn from_records(records: impl IntoIterator<Item = OwnershipRecord>) -> Self {
        let mut map = HashMap::new();
        for record in records {
            map.entry(record.ait_number.clone()).or_insert(record);
        }
        Self { records: map }
    }

    pub fn get(&self, ait_number: &str) -> Option<&OwnershipRecord> {
        self.records.get(ait_number)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl OwnershipDirectory for JsonOwnershipDirectory {
    async fn lookup(&self, ait_number: &str) -> Result<Option<OwnershipRecord>, SourceError> {
        Ok(self.get(ait_number).cloned())
    }
}
