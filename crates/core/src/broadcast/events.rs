use serde::{Deserialize, Serialize};

use crate::ticket::TicketState;

/// Why a ticket halted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected business outcome from a processor.
    Rejection,
    /// Unexpected processor failure, timeout or panic.
    Fault,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Rejection => "rejection",
            FailureKind::Fault => "fault",
        }
    }
}

/// Event pushed to subscribers for real-time dashboard updates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// Snapshot of every ticket. Always the first event a subscriber sees.
    InitialState { tickets: Vec<TicketState> },
    /// A ticket's state changed.
    TicketUpdate { ticket: TicketState },
    /// A run started for a ticket.
    ProcessingStart {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket_id: Option<String>,
    },
    /// A ticket finished its final stage.
    ProcessingComplete { message: String, ticket: TicketState },
    /// A run halted.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<FailureKind>,
    },
}

impl PipelineEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::InitialState { .. } => "initial_state",
            PipelineEvent::TicketUpdate { .. } => "ticket_update",
            PipelineEvent::ProcessingStart { .. } => "processing_start",
            PipelineEvent::ProcessingComplete { .. } => "processing_complete",
            PipelineEvent::Error { .. } => "error",
        }
    }

    pub fn ticket_update(state: &TicketState) -> Self {
        PipelineEvent::TicketUpdate {
            ticket: state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Ticket;

    #[test]
    fn test_wire_shape() {
        let state = TicketState::new(Ticket::new("T1", "IAM", "x"));
        let json = serde_json::to_value(PipelineEvent::ticket_update(&state)).unwrap();
        assert_eq!(json["type"], "ticket_update");
        assert_eq!(json["ticket"]["ticket"]["id"], "T1");

        let json = serde_json::to_value(PipelineEvent::Error {
            message: "boom".to_string(),
            ticket_id: Some("T1".to_string()),
            kind: Some(FailureKind::Fault),
        })
        .unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["kind"], "fault");

        let json = serde_json::to_value(PipelineEvent::ProcessingStart {
            message: "go".to_string(),
            ticket_id: None,
        })
        .unwrap();
        assert!(json.get("ticket_id").is_none());
    }
}
