use serde::{Deserialize, Serialize};

/// An outbound evidence request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EvidenceDraft {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Result of attempting to deliver a draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    Sent,
    Failed { reason: String },
}

impl DeliveryStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryStatus::Sent)
    }
}
