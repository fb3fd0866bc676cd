use async_trait::async_trait;

use crate::audit::{AuditEvent, AuditHandle};
use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

/// Writes the final per-ticket line to the run log.
pub struct LoggingProcessor {
    audit: AuditHandle,
}

impl LoggingProcessor {
    pub fn new(audit: AuditHandle) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl StageProcessor for LoggingProcessor {
    fn name(&self) -> &str {
        "logging"
    }

    async fn process(
        &self,
        ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        self.audit
            .emit(AuditEvent::TicketProcessed {
                ticket_id: ticket.id.clone(),
                risk_level: ticket.risk_level,
            })
            .await;
        Ok(StageOutcome::completed(ticket, "Logged successfully"))
    }
}
