//! Testing utilities and mock implementations.
//!
//! Mocks for the processor and notifier seams, plus fixtures for building
//! tickets and fully mocked registries.
//!
//! # Example
//!
//! ```rust,ignore
//! use governor_core::testing::fixtures;
//!
//! let (registry, mocks) = fixtures::mock_registry();
//! // Build an engine with `registry`, run it, then inspect `mocks[&kind]`.
//! ```

mod mock_notifier;
mod mock_processor;

pub use mock_notifier::MockNotifier;
pub use mock_processor::{MockBehavior, MockStageProcessor, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::MockStageProcessor;
    use crate::source::OwnershipRecord;
    use crate::stage::StageRegistry;
    use crate::ticket::{StageKind, Ticket};

    /// An IAM ticket with an AIT number and an SLA deadline far in the future.
    pub fn iam_ticket(id: &str) -> Ticket {
        Ticket::new(id, "IAM", format!("Access review for {}", id))
            .with_ait_number("AIT-100")
            .with_sla_deadline("2099-12-31")
    }

    /// An IAM ticket already enriched with ownership details.
    pub fn enriched_ticket(id: &str, application_owner: &str) -> Ticket {
        let mut ticket = iam_ticket(id).with_application_owner(application_owner);
        ticket.application_name = Some("Payments Gateway".to_string());
        ticket.lob_owner = Some("Retail Banking".to_string());
        ticket.ait_owner = Some("jdoe".to_string());
        ticket.contacts = vec!["payments-ops@example.com".to_string()];
        ticket
    }

    /// Ownership record for an AIT number.
    pub fn ownership_record(ait_number: &str, application_owner: &str) -> OwnershipRecord {
        OwnershipRecord {
            ait_number: ait_number.to_string(),
            application_name: Some("Payments Gateway".to_string()),
            application_owner: Some(application_owner.to_string()),
            lob_owner: Some("Retail Banking".to_string()),
            ait_owner: Some("jdoe".to_string()),
            contacts: vec!["payments-ops@example.com".to_string()],
        }
    }

    /// A registry where every automated stage is a fresh mock.
    pub fn mock_registry() -> (StageRegistry, HashMap<StageKind, Arc<MockStageProcessor>>) {
        let mut registry = StageRegistry::new();
        let mut mocks = HashMap::new();
        for kind in &StageKind::ALL[1..] {
            let mock = Arc::new(MockStageProcessor::new(kind.as_str()));
            registry.register(*kind, mock.clone());
            mocks.insert(*kind, mock);
        }
        (registry, mocks)
    }
}
