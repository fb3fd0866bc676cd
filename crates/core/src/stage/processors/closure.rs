use async_trait::async_trait;

use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

const CLOSURE_NOTE: &str = " | Evidence attached, ticket closed.";

/// Annotates the description to mark the ticket closed.
#[derive(Default)]
pub struct ClosureProcessor;

#[async_trait]
impl StageProcessor for ClosureProcessor {
    fn name(&self) -> &str {
        "closure"
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        // Re-running after a later halt must not stack the note.
        if !ticket.description.ends_with(CLOSURE_NOTE) {
            ticket.description.push_str(CLOSURE_NOTE);
        }
        Ok(StageOutcome::completed(ticket, "Ticket closed"))
    }
}
