//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notify::{EvidenceDraft, Notifier, NotifyError};

/// Mock implementation of the Notifier trait.
///
/// Records every draft it is asked to deliver and optionally fails.
#[derive(Debug, Default)]
pub struct MockNotifier {
    delivered: Arc<RwLock<Vec<EvidenceDraft>>>,
    failure: Option<String>,
}

impl MockNotifier {
    /// Create a notifier that accepts every draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier that rejects every draft with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            delivered: Arc::new(RwLock::new(Vec::new())),
            failure: Some(reason.into()),
        }
    }

    /// Drafts accepted so far.
    pub async fn delivered(&self) -> Vec<EvidenceDraft> {
        self.delivered.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, draft: &EvidenceDraft) -> Result<(), NotifyError> {
        if let Some(reason) = &self.failure {
            return Err(NotifyError::Unavailable(reason.clone()));
        }
        self.delivered.write().await.push(draft.clone());
        Ok(())
    }
}
