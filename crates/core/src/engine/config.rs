//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::ticket::StageKind;

/// Configuration for the pipeline engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for one processor call. Exceeding it is a fault.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,

    /// Stage at which a run suspends until a reviewer approves.
    #[serde(default = "default_review_gate")]
    pub review_gate: StageKind,

    /// Categories admitted at ingestion (case-insensitive).
    #[serde(default = "default_eligible_categories")]
    pub eligible_categories: Vec<String>,
}

fn default_stage_timeout_secs() -> u64 {
    30
}

fn default_review_gate() -> StageKind {
    StageKind::EvidenceCollect
}

fn default_eligible_categories() -> Vec<String> {
    vec!["IAM".to_string()]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
            review_gate: default_review_gate(),
            eligible_categories: default_eligible_categories(),
        }
    }
}

impl EngineConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }

    pub fn is_eligible(&self, category: &str) -> bool {
        let category = category.trim();
        self.eligible_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            stage_timeout_secs: config.pipeline.stage_timeout_secs,
            review_gate: config.pipeline.review_gate,
            eligible_categories: config.sources.eligible_categories.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.stage_timeout(), Duration::from_secs(30));
        assert_eq!(config.review_gate, StageKind::EvidenceCollect);
        assert!(config.is_eligible("iam"));
        assert!(config.is_eligible(" IAM "));
        assert!(!config.is_eligible("Network"));
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            stage_timeout_secs = 5
        "#;
        let config: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.stage_timeout_secs, 5);
        assert_eq!(config.review_gate, StageKind::EvidenceCollect);
    }

    #[test]
    fn test_from_app_config() {
        let mut app = Config::default();
        app.pipeline.stage_timeout_secs = 12;
        app.pipeline.review_gate = StageKind::Closure;
        app.sources.eligible_categories = vec!["IAM".to_string(), "Access".to_string()];

        let config = EngineConfig::from(&app);
        assert_eq!(config.stage_timeout_secs, 12);
        assert_eq!(config.review_gate, StageKind::Closure);
        assert!(config.is_eligible("access"));
    }
}
