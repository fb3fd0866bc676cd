//! Demo processors: every stage succeeds after a fixed delay.

use std::time::Duration;

use async_trait::async_trait;

use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::{StageKind, Ticket};

pub struct FixtureProcessor {
    kind: StageKind,
    delay: Duration,
}

impl FixtureProcessor {
    pub fn new(kind: StageKind, delay: Duration) -> Self {
        Self { kind, delay }
    }

    fn message(&self, ticket: &Ticket) -> String {
        let or_unknown = |v: Option<&str>| v.unwrap_or("Unknown").to_string();
        match self.kind {
            StageKind::Fetch => "Ticket fetched successfully".to_string(),
            StageKind::CategoryCheck => format!("Category: {}", ticket.category),
            StageKind::SlaPrioritize => {
                format!("SLA: {}", or_unknown(ticket.sla_deadline.as_deref()))
            }
            StageKind::OwnershipEnrich => {
                format!("Owner: {}", or_unknown(ticket.lob_owner.as_deref()))
            }
            StageKind::OwnerSpaceCheck => "App owner verified".to_string(),
            StageKind::EvidenceCollect => "Evidence collected".to_string(),
            StageKind::Closure => "Ticket closed".to_string(),
            StageKind::Logging => "Logged successfully".to_string(),
        }
    }
}

#[async_trait]
impl StageProcessor for FixtureProcessor {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn process(
        &self,
        ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let message = self.message(&ticket);
        Ok(StageOutcome::completed(ticket, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_passes_ticket_through() {
        let mut ticket = Ticket::new("T1", "IAM", "x");
        ticket.lob_owner = Some("Retail".to_string());
        let processor = FixtureProcessor::new(StageKind::OwnershipEnrich, Duration::ZERO);
        let ctx = StageContext::new("T1", StageKind::OwnershipEnrich);

        let outcome = processor.process(ticket.clone(), &ctx).await.unwrap();
        assert_eq!(outcome, StageOutcome::completed(ticket, "Owner: Retail"));
    }

    #[tokio::test]
    async fn test_fixture_waits_for_delay() {
        let processor = FixtureProcessor::new(StageKind::Closure, Duration::from_millis(30));
        let ctx = StageContext::new("T1", StageKind::Closure);

        let start = tokio::time::Instant::now();
        processor
            .process(Ticket::new("T1", "IAM", "x"), &ctx)
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
