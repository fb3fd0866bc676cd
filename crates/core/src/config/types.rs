use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::ticket::StageKind;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub owner_space: OwnerSpaceConfig,
    #[serde(default)]
    pub sla: SlaConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

/// Which processor set the engine runs with.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorMode {
    /// Real business-rule processors backed by the configured data files.
    Live,
    /// Pass-through processors with a fixed delay, for demos.
    #[default]
    Fixture,
}

impl ProcessorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorMode::Live => "live",
            ProcessorMode::Fixture => "fixture",
        }
    }
}

/// Pipeline engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub mode: ProcessorMode,
    /// Upper bound for a single processor call.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
    /// Artificial delay per stage in fixture mode.
    #[serde(default = "default_fixture_delay_ms")]
    pub fixture_delay_ms: u64,
    /// Per-subscriber event queue length.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Run-log channel capacity.
    #[serde(default = "default_log_buffer")]
    pub log_buffer: usize,
    /// Entries kept in the run log; the oldest are evicted first.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Stage that suspends a run until a reviewer approves.
    #[serde(default = "default_review_gate")]
    pub review_gate: StageKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ProcessorMode::default(),
            stage_timeout_secs: default_stage_timeout_secs(),
            fixture_delay_ms: default_fixture_delay_ms(),
            subscriber_buffer: default_subscriber_buffer(),
            log_buffer: default_log_buffer(),
            log_capacity: default_log_capacity(),
            review_gate: default_review_gate(),
        }
    }
}

fn default_stage_timeout_secs() -> u64 {
    30
}

fn default_fixture_delay_ms() -> u64 {
    1000
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_log_buffer() -> usize {
    1000
}

fn default_log_capacity() -> usize {
    10_000
}

fn default_review_gate() -> StageKind {
    StageKind::EvidenceCollect
}

/// Ticket and ownership data sources
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourcesConfig {
    /// JSON array of ticket records.
    #[serde(default)]
    pub tickets_path: Option<PathBuf>,
    /// JSON array of application ownership records.
    #[serde(default)]
    pub ownership_path: Option<PathBuf>,
    /// Categories admitted at ingestion (case-insensitive).
    #[serde(default = "default_eligible_categories")]
    pub eligible_categories: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            tickets_path: None,
            ownership_path: None,
            eligible_categories: default_eligible_categories(),
        }
    }
}

fn default_eligible_categories() -> Vec<String> {
    vec!["IAM".to_string()]
}

/// Owner-space check configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OwnerSpaceConfig {
    #[serde(default = "default_allowed_spaces")]
    pub allowed_spaces: Vec<String>,
}

impl Default for OwnerSpaceConfig {
    fn default() -> Self {
        Self {
            allowed_spaces: default_allowed_spaces(),
        }
    }
}

fn default_allowed_spaces() -> Vec<String> {
    vec!["IAM-Space".to_string(), "Security-Space".to_string()]
}

/// SLA risk thresholds, in days remaining until the deadline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlaConfig {
    #[serde(default = "default_high_within_days")]
    pub high_within_days: i64,
    #[serde(default = "default_medium_within_days")]
    pub medium_within_days: i64,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            high_within_days: default_high_within_days(),
            medium_within_days: default_medium_within_days(),
        }
    }
}

fn default_high_within_days() -> i64 {
    2
}

fn default_medium_within_days() -> i64 {
    5
}

/// Evidence request configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvidenceConfig {
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Used when a ticket has neither an application owner nor contacts.
    #[serde(default = "default_recipient")]
    pub default_recipient: String,
    /// Deliver drafts through the notifier. Drafts are always stored.
    #[serde(default)]
    pub send: bool,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            from_address: default_from_address(),
            default_recipient: default_recipient(),
            send: false,
            webhook: None,
        }
    }
}

fn default_from_address() -> String {
    "iam-governance@example.com".to_string()
}

fn default_recipient() -> String {
    "app_owner@example.com".to_string()
}

/// Outbound webhook used to deliver evidence requests
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
}

fn default_webhook_timeout() -> u64 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub sources: SourcesConfig,
    pub owner_space: OwnerSpaceConfig,
    pub sla: SlaConfig,
    pub evidence: SanitizedEvidenceConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedEvidenceConfig {
    pub from_address: String,
    pub default_recipient: String,
    pub send: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<SanitizedWebhookConfig>,
}

/// Webhook config with the token hidden
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWebhookConfig {
    pub url: String,
    pub token_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            pipeline: config.pipeline.clone(),
            sources: config.sources.clone(),
            owner_space: config.owner_space.clone(),
            sla: config.sla.clone(),
            evidence: SanitizedEvidenceConfig {
                from_address: config.evidence.from_address.clone(),
                default_recipient: config.evidence.default_recipient.clone(),
                send: config.evidence.send,
                webhook: config
                    .evidence
                    .webhook
                    .as_ref()
                    .map(|w| SanitizedWebhookConfig {
                        url: w.url.clone(),
                        token_configured: w.token.as_ref().is_some_and(|t| !t.is_empty()),
                        timeout_secs: w.timeout_secs,
                    }),
            },
        }
    }
}
