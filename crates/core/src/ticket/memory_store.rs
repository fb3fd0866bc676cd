//! In-memory ticket store.

use std::collections::HashMap;
use std::sync::RwLock;

use super::store::{TicketError, TicketStore};
use super::TicketState;

#[derive(Default)]
struct Inner {
    order: Vec<String>,
    states: HashMap<String, TicketState>,
}

/// Process-local ticket store preserving insertion order.
#[derive(Default)]
pub struct InMemoryTicketStore {
    inner: RwLock<Inner>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> TicketError {
    TicketError::Storage("ticket store lock poisoned".to_string())
}

impl TicketStore for InMemoryTicketStore {
    fn get(&self, id: &str) -> Result<Option<TicketState>, TicketError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.states.get(id).cloned())
    }

    fn put(&self, state: TicketState) -> Result<(), TicketError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        let id = state.ticket.id.clone();
        if !inner.states.contains_key(&id) {
            inner.order.push(id.clone());
        }
        inner.states.insert(id, state);
        Ok(())
    }

    fn list(&self) -> Result<Vec<TicketState>, TicketError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.states.get(id).cloned())
            .collect())
    }

    fn count(&self) -> Result<usize, TicketError> {
        let inner = self.inner.read().map_err(poisoned)?;
        Ok(inner.states.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{PipelineStatus, Ticket};

    fn state(id: &str) -> TicketState {
        TicketState::new(Ticket::new(id, "IAM", "desc"))
    }

    #[test]
    fn test_put_and_get() {
        let store = InMemoryTicketStore::new();
        store.put(state("T1")).unwrap();

        let loaded = store.get("T1").unwrap().unwrap();
        assert_eq!(loaded.ticket.id, "T1");
        assert!(store.get("T2").unwrap().is_none());
        assert!(store.contains("T1").unwrap());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let store = InMemoryTicketStore::new();
        for id in ["C", "A", "B"] {
            store.put(state(id)).unwrap();
        }

        let ids: Vec<_> = store.list().unwrap().into_iter().map(|s| s.ticket.id).collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_put_replaces_existing() {
        let store = InMemoryTicketStore::new();
        store.put(state("T1")).unwrap();

        let mut updated = state("T1");
        updated.status = PipelineStatus::InProgress;
        store.put(updated).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(
            store.get("T1").unwrap().unwrap().status,
            PipelineStatus::InProgress
        );
    }
}
