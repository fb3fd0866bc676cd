use super::{
    types::{Config, ProcessorMode},
    ConfigError,
};
use crate::ticket::StageKind;

/// Validate configuration.
///
/// Checks:
/// - server port is not 0
/// - stage timeout and run-log capacity are not 0
/// - the review gate is an automated stage
/// - at least one allowed owner space and one eligible category
/// - SLA thresholds are ordered
/// - live mode has both data paths
/// - sending evidence requires a webhook
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    if config.pipeline.stage_timeout_secs == 0 {
        return Err(invalid("pipeline.stage_timeout_secs cannot be 0"));
    }

    if config.pipeline.subscriber_buffer == 0 || config.pipeline.log_buffer == 0 {
        return Err(invalid("pipeline buffers must be greater than 0"));
    }

    if config.pipeline.log_capacity == 0 {
        return Err(invalid("pipeline.log_capacity must be greater than 0"));
    }

    if config.pipeline.review_gate == StageKind::Fetch {
        return Err(invalid("pipeline.review_gate cannot be the fetch stage"));
    }

    if config.owner_space.allowed_spaces.is_empty() {
        return Err(invalid("owner_space.allowed_spaces cannot be empty"));
    }

    if config.sources.eligible_categories.is_empty() {
        return Err(invalid("sources.eligible_categories cannot be empty"));
    }

    if config.sla.high_within_days > config.sla.medium_within_days {
        return Err(invalid(
            "sla.high_within_days cannot exceed sla.medium_within_days",
        ));
    }

    if config.pipeline.mode == ProcessorMode::Live {
        if config.sources.tickets_path.is_none() {
            return Err(invalid("live mode requires sources.tickets_path"));
        }
        if config.sources.ownership_path.is_none() {
            return Err(invalid("live mode requires sources.ownership_path"));
        }
    }

    if config.evidence.send && config.evidence.webhook.is_none() {
        return Err(invalid("evidence.send requires [evidence.webhook]"));
    }

    Ok(())
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}
