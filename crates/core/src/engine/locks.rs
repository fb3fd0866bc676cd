//! Keyed async mutex: one lock per ticket id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct TicketLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `ticket_id`. The guard can be moved
    /// into a spawned task.
    pub async fn lock(&self, ticket_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(ticket_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
