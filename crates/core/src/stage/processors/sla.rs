//! SLA risk scoring.
//!
//! Risk comes from the time remaining until the deadline, measured from the
//! context clock. A deadline that cannot be parsed scores `Unknown` rather
//! than failing the stage.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::config::SlaConfig;
use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::{RiskLevel, Ticket};

pub struct SlaProcessor {
    high_within: Duration,
    medium_within: Duration,
}

impl SlaProcessor {
    pub fn new(config: &SlaConfig) -> Self {
        Self {
            high_within: Duration::days(config.high_within_days),
            medium_within: Duration::days(config.medium_within_days),
        }
    }

    /// Risk for a deadline string relative to `now`.
    pub fn score(&self, deadline: Option<&str>, now: DateTime<Utc>) -> RiskLevel {
        let Some(deadline) = deadline.and_then(parse_deadline) else {
            return RiskLevel::Unknown;
        };

        let remaining = deadline - now;
        if remaining <= self.high_within {
            RiskLevel::High
        } else if remaining <= self.medium_within {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl Default for SlaProcessor {
    fn default() -> Self {
        Self::new(&SlaConfig::default())
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) and `YYYY-MM-DD` (midnight UTC).
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl StageProcessor for SlaProcessor {
    fn name(&self) -> &str {
        "sla"
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let risk = self.score(ticket.sla_deadline.as_deref(), ctx.now);
        ticket.risk_level = risk;

        let deadline = ticket.sla_deadline.as_deref().unwrap_or("none");
        let message = format!("SLA: {} (risk {})", deadline, risk);
        Ok(StageOutcome::completed(ticket, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::StageKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert!(parse_deadline("2025-11-13").is_some());
        assert!(parse_deadline("2025-11-13T08:30:00").is_some());
        assert!(parse_deadline("2025-11-13T08:30:00+02:00").is_some());
        assert!(parse_deadline("next tuesday").is_none());
        assert!(parse_deadline("").is_none());
    }

    #[test]
    fn test_three_days_out_is_medium() {
        let sla = SlaProcessor::default();
        assert_eq!(sla.score(Some("2025-11-13T12:00:00"), now()), RiskLevel::Medium);
    }

    #[test]
    fn test_thresholds() {
        let sla = SlaProcessor::default();
        assert_eq!(sla.score(Some("2025-11-01"), now()), RiskLevel::High);
        assert_eq!(sla.score(Some("2025-11-11T12:00:00"), now()), RiskLevel::High);
        assert_eq!(sla.score(Some("2025-11-12T12:00:00"), now()), RiskLevel::High);
        assert_eq!(sla.score(Some("2025-11-15T12:00:00"), now()), RiskLevel::Medium);
        assert_eq!(sla.score(Some("2025-11-30"), now()), RiskLevel::Low);
        assert_eq!(sla.score(Some("soon"), now()), RiskLevel::Unknown);
        assert_eq!(sla.score(None, now()), RiskLevel::Unknown);
    }

    #[tokio::test]
    async fn test_process_sets_risk_and_message() {
        let ctx = StageContext::new("T1", StageKind::SlaPrioritize).at(now());
        let ticket = Ticket::new("T1", "IAM", "x").with_sla_deadline("2025-11-13T12:00:00");

        let outcome = SlaProcessor::default().process(ticket, &ctx).await.unwrap();
        match outcome {
            StageOutcome::Completed { ticket, message } => {
                assert_eq!(ticket.risk_level, RiskLevel::Medium);
                assert_eq!(message, "SLA: 2025-11-13T12:00:00 (risk Medium)");
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_deadline_completes_with_unknown() {
        let ctx = StageContext::new("T1", StageKind::SlaPrioritize).at(now());
        let ticket = Ticket::new("T1", "IAM", "x").with_sla_deadline("31/12/2025");

        let outcome = SlaProcessor::default().process(ticket, &ctx).await.unwrap();
        assert!(matches!(
            outcome,
            StageOutcome::Completed { ref ticket, .. } if ticket.risk_level == RiskLevel::Unknown
        ));
    }
}
