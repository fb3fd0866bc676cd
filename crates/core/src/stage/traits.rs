use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ticket::{StageKind, Ticket};

/// Per-call data handed to a processor.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub ticket_id: String,
    pub stage: StageKind,
    /// Clock reading taken when the stage started.
    pub now: DateTime<Utc>,
}

impl StageContext {
    pub fn new(ticket_id: impl Into<String>, stage: StageKind) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            stage,
            now: Utc::now(),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Normal result of a processor call.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Stage succeeded; `ticket` replaces the stored ticket.
    Completed { ticket: Ticket, message: String },
    /// Expected business rejection. Halts the ticket at this stage.
    Rejected { reason: String },
}

impl StageOutcome {
    pub fn completed(ticket: Ticket, message: impl Into<String>) -> Self {
        StageOutcome::Completed {
            ticket,
            message: message.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        StageOutcome::Rejected {
            reason: reason.into(),
        }
    }
}

/// Unexpected processor failure.
#[derive(Debug, Error)]
pub enum ProcessorFault {
    #[error("processor failed: {0}")]
    Failed(String),

    #[error("processor timed out after {0:?}")]
    Timeout(Duration),

    #[error("processor panicked: {0}")]
    Panicked(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("dependency unavailable: {0}")]
    Unavailable(String),
}

/// Uniform contract for every automated stage.
///
/// Static configuration is captured at construction; `ctx` carries only
/// per-call data.
#[async_trait]
pub trait StageProcessor: Send + Sync {
    /// Processor name for logs.
    fn name(&self) -> &str;

    async fn process(&self, ticket: Ticket, ctx: &StageContext)
        -> Result<StageOutcome, ProcessorFault>;
}
