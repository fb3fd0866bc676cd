use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::processors::{
    CategoryProcessor, ClosureProcessor, EvidenceProcessor, FixtureProcessor, LoggingProcessor,
    OwnerSpaceProcessor, OwnershipProcessor, SlaProcessor,
};
use super::StageProcessor;
use crate::audit::AuditHandle;
use crate::config::Config;
use crate::notify::Notifier;
use crate::source::OwnershipDirectory;
use crate::ticket::StageKind;

/// Maps each automated stage to its processor.
///
/// The fetch stage has no processor; it completes at ingestion.
#[derive(Clone, Default)]
pub struct StageRegistry {
    processors: HashMap<StageKind, Arc<dyn StageProcessor>>,
}

impl StageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration.
    pub fn with(mut self, kind: StageKind, processor: Arc<dyn StageProcessor>) -> Self {
        self.register(kind, processor);
        self
    }

    pub fn register(&mut self, kind: StageKind, processor: Arc<dyn StageProcessor>) {
        self.processors.insert(kind, processor);
    }

    pub fn get(&self, kind: StageKind) -> Option<Arc<dyn StageProcessor>> {
        self.processors.get(&kind).cloned()
    }

    /// Automated stages that have no processor.
    pub fn missing_stages(&self) -> Vec<StageKind> {
        StageKind::ALL[1..]
            .iter()
            .copied()
            .filter(|k| !self.processors.contains_key(k))
            .collect()
    }

    /// Business-rule processors.
    pub fn live(
        config: &Config,
        directory: Arc<dyn OwnershipDirectory>,
        notifier: Option<Arc<dyn Notifier>>,
        audit: AuditHandle,
    ) -> Self {
        let mut evidence = EvidenceProcessor::new(&config.evidence);
        if let Some(notifier) = notifier {
            evidence = evidence.with_notifier(notifier);
        }

        Self::new()
            .with(
                StageKind::CategoryCheck,
                Arc::new(CategoryProcessor::new(
                    config.sources.eligible_categories.iter().cloned(),
                )),
            )
            .with(StageKind::SlaPrioritize, Arc::new(SlaProcessor::new(&config.sla)))
            .with(
                StageKind::OwnershipEnrich,
                Arc::new(OwnershipProcessor::new(directory)),
            )
            .with(
                StageKind::OwnerSpaceCheck,
                Arc::new(OwnerSpaceProcessor::new(
                    config.owner_space.allowed_spaces.clone(),
                )),
            )
            .with(StageKind::EvidenceCollect, Arc::new(evidence))
            .with(StageKind::Closure, Arc::new(ClosureProcessor))
            .with(StageKind::Logging, Arc::new(LoggingProcessor::new(audit)))
    }

    /// Demo processors that succeed after `delay`.
    pub fn fixture(delay: Duration) -> Self {
        StageKind::ALL[1..].iter().fold(Self::new(), |registry, kind| {
            registry.with(*kind, Arc::new(FixtureProcessor::new(*kind, delay)))
        })
    }
}
