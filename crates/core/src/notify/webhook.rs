//! Webhook notifier.
//!
//! Posts each draft as JSON to a configured endpoint. Any relay that turns
//! the payload into an email (or chat message) can sit behind it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{EvidenceDraft, Notifier, NotifyError};
use crate::config::WebhookConfig;

pub struct WebhookNotifier {
    client: Client,
    url: String,
    token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .user_agent(concat!("governor/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, draft: &EvidenceDraft) -> Result<(), NotifyError> {
        debug!(url = %self.url, to = %draft.to, "Posting evidence request");

        let mut request = self.client.post(&self.url).json(draft);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Webhook rejected evidence request");
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_ignored() {
        let notifier = WebhookNotifier::new(&WebhookConfig {
            url: "http://localhost:1/hook".to_string(),
            token: Some(String::new()),
            timeout_secs: 1,
        })
        .unwrap();

        assert!(notifier.token.is_none());
        assert_eq!(notifier.name(), "webhook");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let notifier = WebhookNotifier::new(&WebhookConfig {
            url: "http://127.0.0.1:1/hook".to_string(),
            token: None,
            timeout_secs: 1,
        })
        .unwrap();

        let draft = EvidenceDraft {
            from: "a@example.com".to_string(),
            to: "b@example.com".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        };

        let result = notifier.deliver(&draft).await;
        assert!(matches!(result, Err(NotifyError::Http(_))));
    }
}
