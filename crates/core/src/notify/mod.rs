//! Outbound delivery of evidence requests.

mod types;
mod webhook;

pub use types::{DeliveryStatus, EvidenceDraft};
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a notifier backend.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint rejected delivery: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Delivers evidence drafts to their recipients.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &str;

    async fn deliver(&self, draft: &EvidenceDraft) -> Result<(), NotifyError>;
}
