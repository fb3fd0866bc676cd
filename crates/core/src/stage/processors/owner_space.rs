use async_trait::async_trait;

use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

/// Passes tickets whose application owner is one of the allowed spaces.
pub struct OwnerSpaceProcessor {
    allowed_spaces: Vec<String>,
}

impl OwnerSpaceProcessor {
    pub fn new(allowed_spaces: Vec<String>) -> Self {
        Self { allowed_spaces }
    }
}

#[async_trait]
impl StageProcessor for OwnerSpaceProcessor {
    fn name(&self) -> &str {
        "owner_space"
    }

    async fn process(
        &self,
        ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let owner = ticket.application_owner.as_deref().unwrap_or_default();
        if self.allowed_spaces.iter().any(|s| s == owner) {
            return Ok(StageOutcome::completed(ticket, "App owner verified"));
        }

        let reason = if owner.is_empty() {
            "Application owner is not set".to_string()
        } else {
            format!("Application owner '{}' is not in an allowed space", owner)
        };
        Ok(StageOutcome::rejected(reason))
    }
}
