use std::sync::Arc;

use governor_core::{AuditStore, Config, PipelineEngine, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    engine: PipelineEngine,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    pub fn new(config: Config, engine: PipelineEngine, audit_store: Arc<dyn AuditStore>) -> Self {
        Self {
            config,
            engine,
            audit_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn engine(&self) -> &PipelineEngine {
        &self.engine
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
