use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ticket::{RiskLevel, StageKind};

/// Run-log event types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
        mode: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Ingestion
    TicketsLoaded {
        source: String,
        /// Tickets newly added to the store.
        count: usize,
        /// Tickets filtered out by category.
        skipped: usize,
    },
    /// Ingestion found nothing eligible.
    NoTicketsFound {
        source: String,
    },

    // Stage execution
    StageStarted {
        ticket_id: String,
        stage: StageKind,
    },
    StageCompleted {
        ticket_id: String,
        stage: StageKind,
        message: String,
        duration_ms: u64,
    },
    /// Processor returned an expected business rejection.
    StageRejected {
        ticket_id: String,
        stage: StageKind,
        reason: String,
    },
    /// Processor failed unexpectedly (error, timeout or panic).
    StageFaulted {
        ticket_id: String,
        stage: StageKind,
        error: String,
    },

    // Review gate
    ReviewRequested {
        ticket_id: String,
        stage: StageKind,
    },
    ReviewApproved {
        ticket_id: String,
        stage: StageKind,
    },

    PipelineCompleted {
        ticket_id: String,
    },

    /// Written by the logging stage.
    TicketProcessed {
        ticket_id: String,
        risk_level: RiskLevel,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::TicketsLoaded { .. } => "tickets_loaded",
            Self::NoTicketsFound { .. } => "no_tickets_found",
            Self::StageStarted { .. } => "stage_started",
            Self::StageCompleted { .. } => "stage_completed",
            Self::StageRejected { .. } => "stage_rejected",
            Self::StageFaulted { .. } => "stage_faulted",
            Self::ReviewRequested { .. } => "review_requested",
            Self::ReviewApproved { .. } => "review_approved",
            Self::PipelineCompleted { .. } => "pipeline_completed",
            Self::TicketProcessed { .. } => "ticket_processed",
        }
    }

    /// Returns the ticket ID if this event is associated with a ticket
    pub fn ticket_id(&self) -> Option<&str> {
        match self {
            Self::StageStarted { ticket_id, .. }
            | Self::StageCompleted { ticket_id, .. }
            | Self::StageRejected { ticket_id, .. }
            | Self::StageFaulted { ticket_id, .. }
            | Self::ReviewRequested { ticket_id, .. }
            | Self::ReviewApproved { ticket_id, .. }
            | Self::PipelineCompleted { ticket_id }
            | Self::TicketProcessed { ticket_id, .. } => Some(ticket_id),
            _ => None,
        }
    }

    /// Human-readable log line.
    pub fn message(&self) -> String {
        match self {
            Self::ServiceStarted { version, mode, .. } => {
                format!("Service started (version {}, {} mode)", version, mode)
            }
            Self::ServiceStopped { reason } => format!("Service stopped: {}", reason),
            Self::TicketsLoaded { count, skipped, .. } => {
                format!("Loaded {} tickets ({} skipped)", count, skipped)
            }
            Self::NoTicketsFound { .. } => "No tickets found".to_string(),
            Self::StageStarted { ticket_id, stage } => {
                format!("{}: {} started", ticket_id, stage.display_name())
            }
            Self::StageCompleted {
                ticket_id,
                stage,
                message,
                ..
            } => format!("{}: {} completed: {}", ticket_id, stage.display_name(), message),
            Self::StageRejected {
                ticket_id,
                stage,
                reason,
            } => format!("{}: {} rejected: {}", ticket_id, stage.display_name(), reason),
            Self::StageFaulted {
                ticket_id,
                stage,
                error,
            } => format!(
                "{}: {} failed with an unexpected fault: {}",
                ticket_id,
                stage.display_name(),
                error
            ),
            Self::ReviewRequested { ticket_id, .. } => {
                format!("{}: waiting for application team review", ticket_id)
            }
            Self::ReviewApproved { ticket_id, .. } => format!("{}: review approved", ticket_id),
            Self::PipelineCompleted { ticket_id } => format!("{}: pipeline completed", ticket_id),
            Self::TicketProcessed {
                ticket_id,
                risk_level,
            } => format!("Processed ticket {} with risk {}", ticket_id, risk_level),
        }
    }
}

/// A stored run-log record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub ticket_id: Option<String>,
    pub message: String,
    pub data: AuditEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_service_started() {
        let event = AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
            mode: "fixture".to_string(),
        };
        assert_eq!(event.event_type(), "service_started");
        assert_eq!(event.ticket_id(), None);
    }

    #[test]
    fn test_no_tickets_found_message() {
        let event = AuditEvent::NoTicketsFound {
            source: "json".to_string(),
        };
        assert_eq!(event.message(), "No tickets found");
        assert_eq!(event.ticket_id(), None);
    }

    #[test]
    fn test_ticket_processed_message() {
        let event = AuditEvent::TicketProcessed {
            ticket_id: "T-7".to_string(),
            risk_level: RiskLevel::Medium,
        };
        assert_eq!(event.message(), "Processed ticket T-7 with risk Medium");
        assert_eq!(event.ticket_id(), Some("T-7"));
    }

    #[test]
    fn test_fault_message_is_distinct_from_rejection() {
        let rejected = AuditEvent::StageRejected {
            ticket_id: "T".to_string(),
            stage: StageKind::OwnerSpaceCheck,
            reason: "nope".to_string(),
        };
        let faulted = AuditEvent::StageFaulted {
            ticket_id: "T".to_string(),
            stage: StageKind::OwnerSpaceCheck,
            error: "boom".to_string(),
        };
        assert!(rejected.message().contains("rejected"));
        assert!(faulted.message().contains("unexpected fault"));
    }

    #[test]
    fn test_serialization_is_tagged() {
        let event = AuditEvent::StageStarted {
            ticket_id: "T1".to_string(),
            stage: StageKind::SlaPrioritize,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "stage_started");
        assert_eq!(json["stage"], "sla_prioritize");

        let back: AuditEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
