//! Types for the pipeline engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broadcast::FailureKind;
use crate::ticket::StageKind;

/// Errors surfaced synchronously to engine callers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Ticket not found.
    #[error("ticket not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the ticket's current state.
    #[error("invalid state for ticket {ticket_id}: {reason}")]
    InvalidState { ticket_id: String, reason: String },

    /// Ticket store error.
    #[error("ticket store error: {0}")]
    Store(#[from] crate::ticket::TicketError),

    /// Ticket source error.
    #[error("ticket source error: {0}")]
    Source(#[from] crate::source::SourceError),
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The final stage completed.
    Completed,
    /// Suspended at the review gate.
    AwaitingReview,
    /// A stage rejected or faulted.
    Halted { stage: StageKind, kind: FailureKind },
    /// Nothing to do; the ticket was already complete.
    AlreadyCompleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NotFound("ticket-456".to_string());
        assert_eq!(err.to_string(), "ticket not found: ticket-456");

        let err = EngineError::InvalidState {
            ticket_id: "T1".to_string(),
            reason: "ticket is not waiting for review".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid state for ticket T1: ticket is not waiting for review"
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(RunOutcome::Halted {
            stage: StageKind::OwnerSpaceCheck,
            kind: FailureKind::Rejection,
        })
        .unwrap();
        assert_eq!(json["outcome"], "halted");
        assert_eq!(json["stage"], "owner_space_check");
        assert_eq!(json["kind"], "rejection");
    }
}
