use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::source::OwnershipDirectory;
use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

/// Copies ownership details from the directory onto the ticket.
pub struct OwnershipProcessor {
    directory: Arc<dyn OwnershipDirectory>,
}

impl OwnershipProcessor {
    pub fn new(directory: Arc<dyn OwnershipDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl StageProcessor for OwnershipProcessor {
    fn name(&self) -> &str {
        "ownership"
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let Some(ait) = ticket.ait_number.clone() else {
            return Ok(StageOutcome::rejected("Ticket has no AIT number"));
        };

        let record = self
            .directory
            .lookup(&ait)
            .await
            .map_err(|e| ProcessorFault::Unavailable(e.to_string()))?;

        let Some(record) = record else {
            return Ok(StageOutcome::rejected(format!(
                "No ownership record for {}",
                ait
            )));
        };

        debug!(ticket_id = %ticket.id, ait = %ait, "Ownership record found");
        record.apply_to(&mut ticket);
        let message = format!(
            "Owner: {}",
            ticket.lob_owner.as_deref().unwrap_or("Unknown")
        );
        Ok(StageOutcome::completed(ticket, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{JsonOwnershipDirectory, OwnershipRecord};
    use crate::ticket::StageKind;

    fn processor() -> OwnershipProcessor {
        let directory = JsonOwnershipDirectory::from_records(vec![OwnershipRecord {
            ait_number: "AIT-1".to_string(),
            application_name: Some("Payments".to_string()),
            application_owner: Some("IAM-Space".to_string()),
            lob_owner: Some("Retail Banking".to_string()),
            ait_owner: Some("jdoe".to_string()),
            contacts: vec!["ops@example.com".to_string()],
        }]);
        OwnershipProcessor::new(Arc::new(directory))
    }

    fn ctx() -> StageContext {
        StageContext::new("T1", StageKind::OwnershipEnrich)
    }

    #[tokio::test]
    async fn test_enriches_known_ait() {
        let ticket = Ticket::new("T1", "IAM", "x").with_ait_number("AIT-1");
        let outcome = processor().process(ticket, &ctx()).await.unwrap();

        match outcome {
            StageOutcome::Completed { ticket, message } => {
                assert_eq!(message, "Owner: Retail Banking");
                assert_eq!(ticket.application_name.as_deref(), Some("Payments"));
                assert_eq!(ticket.contacts.len(), 1);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_ait_is_rejected() {
        let ticket = Ticket::new("T1", "IAM", "x").with_ait_number("AIT-404");
        let outcome = processor().process(ticket, &ctx()).await.unwrap();
        assert_eq!(
            outcome,
            StageOutcome::rejected("No ownership record for AIT-404")
        );
    }

    #[tokio::test]
    async fn test_missing_ait_is_rejected() {
        let outcome = processor()
            .process(Ticket::new("T1", "IAM", "x"), &ctx())
            .await
            .unwrap();
        assert!(matches!(outcome, StageOutcome::Rejected { .. }));
    }
}
