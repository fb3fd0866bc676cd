use async_trait::async_trait;

use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

/// Accepts tickets whose category is one of the eligible categories
/// (case-insensitive) and tags them with the deliverable type
/// "<category> Category", using the configured spelling.
pub struct CategoryProcessor {
    categories: Vec<String>,
}

impl CategoryProcessor {
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    fn matching(&self, category: &str) -> Option<&str> {
        let category = category.trim();
        self.categories
            .iter()
            .find(|c| c.eq_ignore_ascii_case(category))
            .map(String::as_str)
    }
}

impl Default for CategoryProcessor {
    fn default() -> Self {
        Self::new(["IAM"])
    }
}

#[async_trait]
impl StageProcessor for CategoryProcessor {
    fn name(&self) -> &str {
        "category"
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        _ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let Some(category) = self.matching(&ticket.category) else {
            return Ok(StageOutcome::rejected(format!(
                "Category '{}' is not one of: {}",
                ticket.category,
                self.categories.join(", ")
            )));
        };

        ticket.deliverable_type = Some(format!("{} Category", category));
        let message = format!("Category: {}", category);
        Ok(StageOutcome::completed(ticket, message))
    }
}
