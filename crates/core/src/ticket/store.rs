//! Ticket storage trait and types.

use thiserror::Error;

use crate::ticket::TicketState;

/// Failure of the backing store. Lookups that find nothing return `Ok(None)`.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket storage error: {0}")]
    Storage(String),
}

/// Trait for ticket state storage backends.
///
/// Implementations hold the authoritative [`TicketState`] for every loaded
/// ticket, keyed by ticket id. Writes replace the whole aggregate.
pub trait TicketStore: Send + Sync {
    /// Get a ticket state by ID.
    fn get(&self, id: &str) -> Result<Option<TicketState>, TicketError>;

    /// Insert or replace the state for `state.ticket.id`.
    fn put(&self, state: TicketState) -> Result<(), TicketError>;

    /// All ticket states in load order.
    fn list(&self) -> Result<Vec<TicketState>, TicketError>;

    /// Number of stored tickets.
    fn count(&self) -> Result<usize, TicketError>;

    /// Whether a ticket with this id exists.
    fn contains(&self, id: &str) -> Result<bool, TicketError> {
        Ok(self.get(id)?.is_some())
    }
}
