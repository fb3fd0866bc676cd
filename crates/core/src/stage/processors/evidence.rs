//! Evidence request drafting and optional delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::EvidenceConfig;
use crate::notify::{DeliveryStatus, EvidenceDraft, Notifier};
use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::{EvidenceRecord, Ticket};

pub struct EvidenceProcessor {
    from_address: String,
    default_recipient: String,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EvidenceProcessor {
    pub fn new(config: &EvidenceConfig) -> Self {
        Self {
            from_address: config.from_address.clone(),
            default_recipient: config.default_recipient.clone(),
            notifier: None,
        }
    }

    /// Deliver every draft through `notifier`.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Application owner, else the first contact, else the configured default.
    fn recipient(&self, ticket: &Ticket) -> String {
        ticket
            .application_owner
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| ticket.contacts.first().map(String::as_str))
            .unwrap_or(&self.default_recipient)
            .to_string()
    }

    pub fn draft(&self, ticket: &Ticket) -> EvidenceDraft {
        let body = format!(
            "Please provide completion evidence for deliverable {} ({}).\n\
             SLA Deadline: {}\n\
             Risk Level: {}\n\n\
             Regards,\nIAM Governance Team",
            ticket.id,
            ticket.description,
            ticket.sla_deadline.as_deref().unwrap_or("N/A"),
            ticket.risk_level,
        );

        EvidenceDraft {
            from: self.from_address.clone(),
            to: self.recipient(ticket),
            subject: format!("IAM Deliverable {} - Evidence Required", ticket.id),
            body,
        }
    }
}

#[async_trait]
impl StageProcessor for EvidenceProcessor {
    fn name(&self) -> &str {
        "evidence"
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let draft = self.draft(&ticket);

        let (delivery, message) = match &self.notifier {
            None => (None, format!("Evidence request drafted for {}", draft.to)),
            Some(notifier) => match notifier.deliver(&draft).await {
                Ok(()) => {
                    info!(ticket_id = %ticket.id, to = %draft.to, "Evidence request sent");
                    (
                        Some(DeliveryStatus::Sent),
                        format!("Evidence request sent to {}", draft.to),
                    )
                }
                Err(e) => {
                    warn!(ticket_id = %ticket.id, notifier = notifier.name(), error = %e, "Evidence request delivery failed");
                    (
                        Some(DeliveryStatus::Failed {
                            reason: e.to_string(),
                        }),
                        format!("Evidence request for {} could not be sent", draft.to),
                    )
                }
            },
        };

        ticket.evidence = Some(EvidenceRecord { draft, delivery });
        Ok(StageOutcome::completed(ticket, message))
    }
}
