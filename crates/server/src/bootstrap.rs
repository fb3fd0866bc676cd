//! Wiring of the engine's collaborators from configuration.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use governor_core::{
    AuditHandle, Config, JsonOwnershipDirectory, JsonTicketSource, Notifier, OwnershipDirectory,
    ProcessorMode, StageRegistry, StaticTicketSource, TicketSource, WebhookNotifier,
};

/// Build the processor registry for the configured mode.
pub async fn build_registry(config: &Config, audit: AuditHandle) -> Result<StageRegistry> {
    match config.pipeline.mode {
        ProcessorMode::Fixture => {
            let delay = Duration::from_millis(config.pipeline.fixture_delay_ms);
            info!(?delay, "Using fixture processors");
            Ok(StageRegistry::fixture(delay))
        }
        ProcessorMode::Live => {
            let Some(path) = &config.sources.ownership_path else {
                bail!("live mode requires sources.ownership_path");
            };
            let directory = JsonOwnershipDirectory::load(path)
                .await
                .with_context(|| format!("Failed to load ownership records from {:?}", path))?;
            info!(records = directory.len(), "Ownership directory loaded");

            let notifier = build_notifier(config)?;
            let directory: Arc<dyn OwnershipDirectory> = Arc::new(directory);
            Ok(StageRegistry::live(config, directory, notifier, audit))
        }
    }
}

/// Notifier for evidence delivery, when sending is enabled.
pub fn build_notifier(config: &Config) -> Result<Option<Arc<dyn Notifier>>> {
    if !config.evidence.send {
        info!("Evidence delivery disabled, requests are drafted only");
        return Ok(None);
    }
    let Some(webhook) = &config.evidence.webhook else {
        bail!("evidence.send requires evidence.webhook");
    };
    let notifier = WebhookNotifier::new(webhook).context("Failed to create webhook notifier")?;
    info!(url = %webhook.url, "Evidence requests will be delivered by webhook");
    Ok(Some(Arc::new(notifier)))
}

/// Ticket source for startup ingestion.
///
/// In fixture mode tickets are joined with ownership records at load time, so
/// they arrive already enriched.
pub async fn build_source(config: &Config) -> Result<Box<dyn TicketSource>> {
    let Some(tickets_path) = &config.sources.tickets_path else {
        info!("No ticket file configured");
        return Ok(Box::new(StaticTicketSource::new(Vec::new())));
    };

    let mut source = JsonTicketSource::new(tickets_path);
    if config.pipeline.mode == ProcessorMode::Fixture {
        if let Some(ownership_path) = &config.sources.ownership_path {
            let directory = JsonOwnershipDirectory::load(ownership_path)
                .await
                .with_context(|| {
                    format!("Failed to load ownership records from {:?}", ownership_path)
                })?;
            source = source.with_ownership(directory);
        }
    }
    Ok(Box::new(source))
}
