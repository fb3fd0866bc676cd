use std::collections::VecDeque;
use std::sync::RwLock;

use super::{AuditError, AuditFilter, AuditRecord, AuditStore};

const DEFAULT_CAPACITY: usize = 10_000;

/// In-memory run log holding the most recent `capacity` entries.
///
/// Ids keep counting up after the oldest entries are evicted.
pub struct InMemoryAuditStore {
    inner: RwLock<Ring>,
}

struct Ring {
    records: VecDeque<AuditRecord>,
    capacity: usize,
    last_id: i64,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(Ring {
                records: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                last_id: 0,
            }),
        }
    }
}

impl Default for InMemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> AuditError {
    AuditError::Storage("run log lock poisoned".to_string())
}

impl AuditStore for InMemoryAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let mut ring = self.inner.write().map_err(poisoned)?;
        ring.last_id += 1;
        let mut stored = record.clone();
        stored.id = ring.last_id;
        if ring.records.len() == ring.capacity {
            ring.records.pop_front();
        }
        ring.records.push_back(stored);
        Ok(ring.last_id)
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let ring = self.inner.read().map_err(poisoned)?;
        let matching: Vec<&AuditRecord> =
            ring.records.iter().filter(|r| filter.matches(r)).collect();
        let skip = if filter.limit == 0 {
            0
        } else {
            matching.len().saturating_sub(filter.limit)
        };
        Ok(matching.into_iter().skip(skip).cloned().collect())
    }

    fn count(&self, filter: &AuditFilter) -> Result<usize, AuditError> {
        let ring = self.inner.read().map_err(poisoned)?;
        Ok(ring.records.iter().filter(|r| filter.matches(r)).count())
    }
}
