use serde::{Deserialize, Serialize};

use crate::ticket::{RiskLevel, Ticket};

/// A ticket as exported by the ticketing system.
///
/// Most fields are optional on input; upstream exports are inconsistent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TicketRecord {
    pub ticket_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ait_number: Option<String>,
    #[serde(default, alias = "deliverableType")]
    pub deliverable_type: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub sla_deadline: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
    #[serde(default)]
    pub arm_id: Option<String>,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub application_owner: Option<String>,
    #[serde(default)]
    pub lob_owner: Option<String>,
    #[serde(default)]
    pub ait_owner: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl From<TicketRecord> for Ticket {
    fn from(r: TicketRecord) -> Self {
        Ticket {
            id: r.ticket_id,
            description: r.description,
            category: r.category,
            deliverable_type: r.deliverable_type.filter(|s| !s.is_empty()),
            risk_level: r
                .risk_level
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(RiskLevel::Unknown),
            sla_deadline: r.sla_deadline,
            created_on: r.created_on,
            ait_number: r.ait_number.filter(|s| !s.is_empty()),
            application_name: r.application_name,
            application_owner: r.application_owner,
            lob_owner: r.lob_owner,
            ait_owner: r.ait_owner,
            contacts: r.contacts,
            arm_id: r.arm_id,
            evidence: None,
        }
    }
}

/// Ownership details for one application, keyed by AIT number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnershipRecord {
    pub ait_number: String,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub application_owner: Option<String>,
    #[serde(default)]
    pub lob_owner: Option<String>,
    #[serde(default)]
    pub ait_owner: Option<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
}

impl OwnershipRecord {
    /// Copy ownership fields onto a ticket.
    pub fn apply_to(&self, ticket: &mut Ticket) {
        ticket.application_name = self.application_name.clone();
        ticket.application_owner = self.application_owner.clone();
        ticket.lob_owner = self.lob_owner.clone();
        ticket.ait_owner = self.ait_owner.clone();
        ticket.contacts = self.contacts.clone();
    }
}
