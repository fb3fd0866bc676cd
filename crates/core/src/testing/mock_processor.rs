//! Mock stage processor for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
use crate::ticket::Ticket;

/// What a mock processor does on a call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the ticket unchanged with this message.
    Complete(String),
    /// Return a business rejection.
    Reject(String),
    /// Return `ProcessorFault::Failed`.
    Fault(String),
    /// Panic inside the processor.
    Panic(String),
    /// Sleep far longer than any test timeout.
    Hang,
    /// Complete with a different ticket id.
    ChangeId(String),
}

/// A recorded processor call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub ticket_id: String,
    pub ticket: Ticket,
}

/// Mock implementation of the StageProcessor trait.
///
/// Provides controllable behavior for testing:
/// - Count and record calls
/// - Script per-call outcomes, falling back to a default
/// - Simulate slow processors
///
/// # Example
///
/// ```rust,ignore
/// use governor_core::testing::{MockBehavior, MockStageProcessor};
///
/// let processor = MockStageProcessor::new("owner_space");
/// processor.push_behavior(MockBehavior::Reject("not allowed".into())).await;
///
/// // ... run the engine ...
///
/// assert_eq!(processor.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockStageProcessor {
    name: String,
    default_behavior: Arc<RwLock<MockBehavior>>,
    script: Arc<RwLock<VecDeque<MockBehavior>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    delay: Arc<RwLock<Duration>>,
}

impl MockStageProcessor {
    /// Create a processor that completes every call.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("{} ok", name);
        Self {
            name,
            default_behavior: Arc::new(RwLock::new(MockBehavior::Complete(message))),
            script: Arc::new(RwLock::new(VecDeque::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Create a processor with a fixed behavior for every call.
    pub fn with_behavior(name: impl Into<String>, behavior: MockBehavior) -> Self {
        let mut processor = Self::new(name);
        processor.default_behavior = Arc::new(RwLock::new(behavior));
        processor
    }

    /// Set the behavior used once the script is exhausted.
    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    /// Queue a behavior for the next unscripted call.
    pub async fn push_behavior(&self, behavior: MockBehavior) {
        self.script.write().await.push_back(behavior);
    }

    /// Delay every call by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl StageProcessor for MockStageProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(
        &self,
        mut ticket: Ticket,
        ctx: &StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        self.calls.write().await.push(RecordedCall {
            ticket_id: ctx.ticket_id.clone(),
            ticket: ticket.clone(),
        });

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.script.write().await.pop_front();
        let behavior = match scripted {
            Some(b) => b,
            None => self.default_behavior.read().await.clone(),
        };

        match behavior {
            MockBehavior::Complete(message) => Ok(StageOutcome::completed(ticket, message)),
            MockBehavior::Reject(reason) => Ok(StageOutcome::rejected(reason)),
            MockBehavior::Fault(msg) => Err(ProcessorFault::Failed(msg)),
            MockBehavior::Panic(msg) => panic!("{}", msg),
            MockBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(StageOutcome::completed(ticket, "woke up"))
            }
            MockBehavior::ChangeId(id) => {
                ticket.id = id;
                Ok(StageOutcome::completed(ticket, "changed id"))
            }
        }
    }
}
