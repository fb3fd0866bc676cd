//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::notify::{DeliveryStatus, EvidenceDraft};

// ============================================================================
// Ticket
// ============================================================================

/// SLA risk level assigned by the prioritization stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
            RiskLevel::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unrecognised maps to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "high" => RiskLevel::High,
            "medium" => RiskLevel::Medium,
            "low" => RiskLevel::Low,
            _ => RiskLevel::Unknown,
        })
    }
}

/// Evidence request produced by the evidence stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub draft: EvidenceDraft,
    /// Outcome of the outbound send, if one was attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryStatus>,
}

/// A governance work item.
///
/// Stage processors fill in the optional fields as the ticket moves through
/// the pipeline (risk level, ownership details, evidence draft).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier from the originating system.
    pub id: String,

    /// Free-text description of the deliverable.
    pub description: String,

    /// Category as received (e.g. "IAM").
    pub category: String,

    /// Deliverable classification set by the category stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverable_type: Option<String>,

    #[serde(default)]
    pub risk_level: RiskLevel,

    /// SLA deadline as received. Parsed by the SLA stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sla_deadline: Option<String>,

    /// Creation timestamp as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,

    /// Application (AIT) number used for the ownership lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ait_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_owner: Option<String>,

    /// Line-of-business owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lob_owner: Option<String>,

    /// Technical owner of the application.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ait_owner: Option<String>,

    #[serde(default)]
    pub contacts: Vec<String>,

    /// Reference into the originating system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arm_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceRecord>,
}

impl Ticket {
    /// Create a ticket with just the identity fields set.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_sla_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.sla_deadline = Some(deadline.into());
        self
    }

    pub fn with_ait_number(mut self, ait_number: impl Into<String>) -> Self {
        self.ait_number = Some(ait_number.into());
        self
    }

    pub fn with_application_owner(mut self, owner: impl Into<String>) -> Self {
        self.application_owner = Some(owner.into());
        self
    }
}

// ============================================================================
// Stages
// ============================================================================

/// The fixed, ordered sequence of pipeline stages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Fetch,
    CategoryCheck,
    SlaPrioritize,
    OwnershipEnrich,
    OwnerSpaceCheck,
    EvidenceCollect,
    Closure,
    Logging,
}

impl StageKind {
    /// Every stage in pipeline order.
    pub const ALL: [StageKind; 8] = [
        StageKind::Fetch,
        StageKind::CategoryCheck,
        StageKind::SlaPrioritize,
        StageKind::OwnershipEnrich,
        StageKind::OwnerSpaceCheck,
        StageKind::EvidenceCollect,
        StageKind::Closure,
        StageKind::Logging,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// The final stage; completing it completes the ticket.
    pub const LAST: StageKind = StageKind::Logging;

    /// Zero-based position in the pipeline.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<StageKind> {
        Self::ALL.get(index).copied()
    }

    /// Human-readable stage name shown on dashboards.
    pub fn display_name(self) -> &'static str {
        match self {
            StageKind::Fetch => "Ticket Fetching",
            StageKind::CategoryCheck => "Category Check",
            StageKind::SlaPrioritize => "SLA Prioritization",
            StageKind::OwnershipEnrich => "Ownership Enrichment",
            StageKind::OwnerSpaceCheck => "App Owner Check",
            StageKind::EvidenceCollect => "Evidence Collection",
            StageKind::Closure => "Ticket Closure",
            StageKind::Logging => "Logging",
        }
    }

    /// Message recorded when the stage starts running.
    pub fn start_message(self) -> &'static str {
        match self {
            StageKind::Fetch => "Fetching ticket...",
            StageKind::CategoryCheck => "Checking category...",
            StageKind::SlaPrioritize => "Calculating SLA priority...",
            StageKind::OwnershipEnrich => "Fetching ownership details...",
            StageKind::OwnerSpaceCheck => "Checking app owner space...",
            StageKind::EvidenceCollect => "Preparing evidence emails...",
            StageKind::Closure => "Closing ticket...",
            StageKind::Logging => "Logging...",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Fetch => "fetch",
            StageKind::CategoryCheck => "category_check",
            StageKind::SlaPrioritize => "sla_prioritize",
            StageKind::OwnershipEnrich => "ownership_enrich",
            StageKind::OwnerSpaceCheck => "owner_space_check",
            StageKind::EvidenceCollect => "evidence_collect",
            StageKind::Closure => "closure",
            StageKind::Logging => "logging",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single stage instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Error,
}

/// One stage instance on a ticket. Only `status` and `message` change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// One-based ordinal, as shown on dashboards.
    pub id: u8,
    pub kind: StageKind,
    pub name: String,
    pub status: StageStatus,
    pub message: String,
}

impl Stage {
    fn pending(kind: StageKind) -> Self {
        Self {
            id: kind.index() as u8 + 1,
            kind,
            name: kind.display_name().to_string(),
            status: StageStatus::Pending,
            message: String::new(),
        }
    }
}

// ============================================================================
// Ticket state aggregate
// ============================================================================

/// Overall pipeline status of a ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl PipelineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::NotStarted => "not-started",
            PipelineStatus::InProgress => "in-progress",
            PipelineStatus::Completed => "completed",
        }
    }
}

/// A ticket together with its pipeline progress.
///
/// `current_stage` is the index of the last completed stage and never
/// decreases. While `waiting_for_review` is set the review-gate stage stays
/// `in-progress`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TicketState {
    pub ticket: Ticket,
    pub stages: Vec<Stage>,
    pub current_stage: usize,
    pub status: PipelineStatus,
    pub waiting_for_review: bool,
    pub updated_at: DateTime<Utc>,
}

impl TicketState {
    /// Initial state for a freshly fetched ticket: the fetch stage is
    /// already complete.
    pub fn new(ticket: Ticket) -> Self {
        let mut stages: Vec<Stage> = StageKind::ALL.iter().map(|k| Stage::pending(*k)).collect();
        stages[StageKind::Fetch.index()].status = StageStatus::Completed;
        stages[StageKind::Fetch.index()].message = "Ticket fetched successfully".to_string();

        Self {
            ticket,
            stages,
            current_stage: StageKind::Fetch.index(),
            status: PipelineStatus::NotStarted,
            waiting_for_review: false,
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.ticket.id
    }

    pub fn stage(&self, kind: StageKind) -> &Stage {
        &self.stages[kind.index()]
    }

    pub fn set_stage(&mut self, kind: StageKind, status: StageStatus, message: impl Into<String>) {
        let stage = &mut self.stages[kind.index()];
        stage.status = status;
        stage.message = message.into();
    }

    pub fn is_completed(&self) -> bool {
        self.status == PipelineStatus::Completed
    }

    /// Stage currently marked as errored, if the last run halted.
    pub fn halted_stage(&self) -> Option<StageKind> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Error)
            .map(|s| s.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_fetch_completed() {
        let state = TicketState::new(Ticket::new("T1", "IAM", "Rotate keys"));

        assert_eq!(state.stages.len(), StageKind::COUNT);
        assert_eq!(state.current_stage, 0);
        assert_eq!(state.status, PipelineStatus::NotStarted);
        assert!(!state.waiting_for_review);
        assert_eq!(state.stage(StageKind::Fetch).status, StageStatus::Completed);
        assert!(state.stages[1..]
            .iter()
            .all(|s| s.status == StageStatus::Pending));
    }

    #[test]
    fn test_stage_ordinals_and_names() {
        let state = TicketState::new(Ticket::new("T1", "IAM", "x"));
        assert_eq!(state.stages[0].id, 1);
        assert_eq!(state.stages[7].id, 8);
        assert_eq!(state.stages[5].name, "Evidence Collection");
        assert_eq!(StageKind::from_index(7), Some(StageKind::Logging));
        assert_eq!(StageKind::from_index(8), None);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let state = TicketState::new(Ticket::new("T1", "IAM", "x").with_sla_deadline("2030-01-01"));
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["currentStage"], 0);
        assert_eq!(json["waitingForReview"], false);
        assert_eq!(json["status"], "not-started");
        assert_eq!(json["ticket"]["slaDeadline"], "2030-01-01");
        assert_eq!(json["stages"][0]["status"], "completed");
        assert_eq!(json["stages"][1]["status"], "pending");
        assert_eq!(json["stages"][2]["kind"], "sla_prioritize");
    }

    #[test]
    fn test_risk_level_parsing() {
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!("medium".parse::<RiskLevel>().unwrap(), RiskLevel::Medium);
        assert_eq!(" Low ".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert_eq!("whatever".parse::<RiskLevel>().unwrap(), RiskLevel::Unknown);
    }

    #[test]
    fn test_halted_stage() {
        let mut state = TicketState::new(Ticket::new("T2", "IAM", "x"));
        assert_eq!(state.halted_stage(), None);

        state.set_stage(StageKind::OwnerSpaceCheck, StageStatus::Error, "not allowed");
        assert_eq!(state.halted_stage(), Some(StageKind::OwnerSpaceCheck));
    }
}
