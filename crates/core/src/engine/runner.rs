//! Pipeline engine implementation.
//!
//! Drives one ticket at a time through the stage sequence:
//! - runs for different tickets proceed concurrently
//! - runs for the same ticket are serialized by a per-ticket lock
//! - each processor call runs in its own task, bounded by the stage timeout

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::broadcast::{BroadcastHub, FailureKind, PipelineEvent, Subscription};
use crate::metrics::{
    PIPELINES_COMPLETED, STAGE_DURATION, STAGE_OUTCOMES, TICKETS_AWAITING_REVIEW,
    TICKETS_INGESTED,
};
use crate::source::TicketSource;
use crate::stage::{ProcessorFault, StageContext, StageOutcome, StageRegistry};
use crate::ticket::{
    PipelineStatus, StageKind, StageStatus, Ticket, TicketState, TicketStore,
};

use super::config::EngineConfig;
use super::locks::TicketLocks;
use super::types::{EngineError, RunOutcome};

/// Stage message while a ticket sits at the review gate.
pub const REVIEW_WAITING_MESSAGE: &str = "Waiting for application team review";

/// Gate stage message once a reviewer approves.
pub const REVIEW_APPROVED_MESSAGE: &str = "Review approved";

/// Result of running a single stage.
enum StageStep {
    Advanced,
    Paused,
    Halted(FailureKind),
}

/// The stage pipeline engine.
///
/// Cheap to clone; all clones share the same store, hub and locks.
#[derive(Clone)]
pub struct PipelineEngine {
    config: Arc<EngineConfig>,
    store: Arc<dyn TicketStore>,
    registry: Arc<StageRegistry>,
    hub: Arc<BroadcastHub>,
    audit: Option<AuditHandle>,
    locks: Arc<TicketLocks>,
}

impl PipelineEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn TicketStore>,
        registry: StageRegistry,
        hub: Arc<BroadcastHub>,
        audit: Option<AuditHandle>,
    ) -> Self {
        let missing = registry.missing_stages();
        if !missing.is_empty() {
            warn!(?missing, "Stage registry is incomplete; those stages will fault");
        }

        Self {
            config: Arc::new(config),
            store,
            registry: Arc::new(registry),
            hub,
            audit,
            locks: Arc::new(TicketLocks::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_ticket(&self, ticket_id: &str) -> Result<TicketState, EngineError> {
        self.load(ticket_id)
    }

    pub fn list_tickets(&self) -> Result<Vec<TicketState>, EngineError> {
        Ok(self.store.list()?)
    }

    /// Subscribe to pipeline events. The first event is a snapshot.
    pub fn subscribe(&self) -> Result<Subscription, EngineError> {
        Ok(self.hub.subscribe()?)
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Fetch tickets from `source` and add every eligible, previously unseen
    /// ticket to the store. Returns the ids that were added.
    pub async fn ingest(&self, source: &dyn TicketSource) -> Result<Vec<String>, EngineError> {
        let fetched = source.fetch().await?;
        let total = fetched.len();
        let eligible: Vec<Ticket> = fetched
            .into_iter()
            .filter(|t| self.config.is_eligible(&t.category))
            .collect();
        let skipped = total - eligible.len();

        if eligible.is_empty() {
            info!(source = source.name(), fetched = total, "No tickets found");
            self.emit(AuditEvent::NoTicketsFound {
                source: source.name().to_string(),
            })
            .await;
            return Ok(Vec::new());
        }

        let mut added = Vec::with_capacity(eligible.len());
        for ticket in eligible {
            let _guard = self.locks.lock(&ticket.id).await;
            if self.store.contains(&ticket.id)? {
                debug!(ticket_id = %ticket.id, "Ticket already loaded, keeping existing state");
                continue;
            }

            let state = TicketState::new(ticket);
            added.push(state.ticket.id.clone());
            self.save(state)?;
        }

        TICKETS_INGESTED.inc_by(added.len() as u64);
        info!(
            source = source.name(),
            added = added.len(),
            skipped,
            "Tickets loaded"
        );
        self.emit(AuditEvent::TicketsLoaded {
            source: source.name().to_string(),
            count: added.len(),
            skipped,
        })
        .await;

        Ok(added)
    }

    // =========================================================================
    // Triggers
    // =========================================================================

    /// Schedule a run for `ticket_id` and return immediately.
    pub fn start_pipeline(&self, ticket_id: &str) -> Result<(), EngineError> {
        if !self.store.contains(ticket_id)? {
            return Err(EngineError::NotFound(ticket_id.to_string()));
        }

        let engine = self.clone();
        let ticket_id = ticket_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine.advance(&ticket_id).await {
                error!(ticket_id = %ticket_id, error = %e, "Pipeline run failed");
            }
        });
        Ok(())
    }

    /// Approve the review for `ticket_id` and schedule the rest of the run.
    ///
    /// A ticket that is not waiting is rejected from the stored state without
    /// touching the ticket lock, so callers never block behind a running
    /// pipeline. A waiting ticket holds no long-lived lock; the check is
    /// repeated under the lock before the gate transition.
    pub async fn approve_review(&self, ticket_id: &str) -> Result<(), EngineError> {
        ensure_waiting(&self.load(ticket_id)?)?;

        let guard = self.locks.lock(ticket_id).await;
        self.open_gate(ticket_id).await?;

        let engine = self.clone();
        let ticket_id = ticket_id.to_string();
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = engine.run_locked(&ticket_id).await {
                error!(ticket_id = %ticket_id, error = %e, "Pipeline run failed after review");
            }
        });
        Ok(())
    }

    /// Run `ticket_id` forward until it completes, halts or reaches the
    /// review gate. Waits for any in-flight run on the same ticket first.
    pub async fn advance(&self, ticket_id: &str) -> Result<RunOutcome, EngineError> {
        let _guard = self.locks.lock(ticket_id).await;
        self.run_locked(ticket_id).await
    }

    /// Approve the review and run the remaining stages to completion.
    pub async fn resume_after_review(&self, ticket_id: &str) -> Result<RunOutcome, EngineError> {
        let _guard = self.locks.lock(ticket_id).await;
        self.open_gate(ticket_id).await?;
        self.run_locked(ticket_id).await
    }

    // =========================================================================
    // Transitions (callers hold the ticket lock)
    // =========================================================================

    async fn open_gate(&self, ticket_id: &str) -> Result<(), EngineError> {
        let mut state = self.load(ticket_id)?;
        ensure_waiting(&state)?;

        let gate = self.config.review_gate;
        state.set_stage(gate, StageStatus::Completed, REVIEW_APPROVED_MESSAGE);
        state.waiting_for_review = false;
        state.current_stage = state.current_stage.max(gate.index());
        self.save(state)?;

        TICKETS_AWAITING_REVIEW.dec();
        info!(ticket_id = %ticket_id, "Review approved");
        self.emit(AuditEvent::ReviewApproved {
            ticket_id: ticket_id.to_string(),
            stage: gate,
        })
        .await;
        Ok(())
    }

    async fn run_locked(&self, ticket_id: &str) -> Result<RunOutcome, EngineError> {
        let mut state = self.load(ticket_id)?;

        if state.is_completed() {
            debug!(ticket_id = %ticket_id, "Ticket already completed");
            return Ok(RunOutcome::AlreadyCompleted);
        }
        if state.waiting_for_review {
            debug!(ticket_id = %ticket_id, "Ticket is waiting for review");
            return Ok(RunOutcome::AwaitingReview);
        }

        let gate = self.config.review_gate.index();
        let last = if state.current_stage >= gate {
            StageKind::LAST.index()
        } else {
            gate
        };

        info!(
            ticket_id = %ticket_id,
            from_stage = state.current_stage + 1,
            "Processing ticket"
        );
        self.hub.publish(PipelineEvent::ProcessingStart {
            message: format!("Processing ticket {}", ticket_id),
            ticket_id: Some(ticket_id.to_string()),
        });

        for index in state.current_stage + 1..=last {
            let kind = StageKind::ALL[index];
            match self.run_stage(&mut state, kind).await? {
                StageStep::Advanced => {}
                StageStep::Paused => return Ok(RunOutcome::AwaitingReview),
                StageStep::Halted(failure) => {
                    return Ok(RunOutcome::Halted {
                        stage: kind,
                        kind: failure,
                    })
                }
            }
        }

        if state.current_stage == StageKind::LAST.index() {
            self.finish(state).await?;
            return Ok(RunOutcome::Completed);
        }

        // Only reachable with a review gate on the final stage.
        Ok(RunOutcome::AwaitingReview)
    }

    async fn run_stage(
        &self,
        state: &mut TicketState,
        kind: StageKind,
    ) -> Result<StageStep, EngineError> {
        let ticket_id = state.ticket.id.clone();

        state.status = PipelineStatus::InProgress;
        state.set_stage(kind, StageStatus::InProgress, kind.start_message());
        self.save(state.clone())?;
        debug!(ticket_id = %ticket_id, stage = %kind, "Stage started");
        self.emit(AuditEvent::StageStarted {
            ticket_id: ticket_id.clone(),
            stage: kind,
        })
        .await;

        let ctx = StageContext::new(ticket_id.clone(), kind);
        let started = Instant::now();
        let result = self.invoke(kind, state.ticket.clone(), ctx).await;
        let elapsed = started.elapsed();
        STAGE_DURATION
            .with_label_values(&[kind.as_str()])
            .observe(elapsed.as_secs_f64());

        let (ticket, message) = match result {
            Ok(StageOutcome::Completed { ticket, message }) if ticket.id == ticket_id => {
                (ticket, message)
            }
            Ok(StageOutcome::Completed { ticket, .. }) => {
                let fault = ProcessorFault::Malformed(format!(
                    "processor changed ticket id from {} to {}",
                    ticket_id, ticket.id
                ));
                return self.halt(state, kind, FailureKind::Fault, fault.to_string()).await;
            }
            Ok(StageOutcome::Rejected { reason }) => {
                return self.halt(state, kind, FailureKind::Rejection, reason).await;
            }
            Err(fault) => {
                return self.halt(state, kind, FailureKind::Fault, fault.to_string()).await;
            }
        };

        state.ticket = ticket;
        self.emit(AuditEvent::StageCompleted {
            ticket_id: ticket_id.clone(),
            stage: kind,
            message: message.clone(),
            duration_ms: elapsed.as_millis() as u64,
        })
        .await;

        if kind == self.config.review_gate {
            state.waiting_for_review = true;
            state.set_stage(kind, StageStatus::InProgress, REVIEW_WAITING_MESSAGE);
            self.save(state.clone())?;

            STAGE_OUTCOMES
                .with_label_values(&[kind.as_str(), "awaiting_review"])
                .inc();
            TICKETS_AWAITING_REVIEW.inc();
            info!(ticket_id = %ticket_id, stage = %kind, "Waiting for review");
            self.emit(AuditEvent::ReviewRequested {
                ticket_id,
                stage: kind,
            })
            .await;
            return Ok(StageStep::Paused);
        }

        state.set_stage(kind, StageStatus::Completed, message);
        state.current_stage = state.current_stage.max(kind.index());
        self.save(state.clone())?;

        STAGE_OUTCOMES
            .with_label_values(&[kind.as_str(), "completed"])
            .inc();
        debug!(ticket_id = %ticket_id, stage = %kind, ?elapsed, "Stage completed");
        Ok(StageStep::Advanced)
    }

    /// Mark `kind` as errored and stop the run. Overall status stays
    /// in-progress so the ticket can be re-triggered.
    async fn halt(
        &self,
        state: &mut TicketState,
        kind: StageKind,
        failure: FailureKind,
        detail: String,
    ) -> Result<StageStep, EngineError> {
        let ticket_id = state.ticket.id.clone();

        state.set_stage(kind, StageStatus::Error, detail.clone());
        self.save(state.clone())?;

        let (message, event) = match failure {
            FailureKind::Rejection => {
                warn!(ticket_id = %ticket_id, stage = %kind, reason = %detail, "Stage rejected ticket");
                (
                    format!("{} rejected ticket {}: {}", kind.display_name(), ticket_id, detail),
                    AuditEvent::StageRejected {
                        ticket_id: ticket_id.clone(),
                        stage: kind,
                        reason: detail,
                    },
                )
            }
            FailureKind::Fault => {
                error!(ticket_id = %ticket_id, stage = %kind, error = %detail, "Stage faulted");
                (
                    format!(
                        "Unexpected fault in {} for ticket {}: {}",
                        kind.display_name(),
                        ticket_id,
                        detail
                    ),
                    AuditEvent::StageFaulted {
                        ticket_id: ticket_id.clone(),
                        stage: kind,
                        error: detail,
                    },
                )
            }
        };

        STAGE_OUTCOMES
            .with_label_values(&[kind.as_str(), failure.as_str()])
            .inc();
        self.hub.publish(PipelineEvent::Error {
            message,
            ticket_id: Some(ticket_id),
            kind: Some(failure),
        });
        self.emit(event).await;

        Ok(StageStep::Halted(failure))
    }

    async fn finish(&self, mut state: TicketState) -> Result<(), EngineError> {
        let ticket_id = state.ticket.id.clone();
        state.status = PipelineStatus::Completed;
        state.updated_at = Utc::now();
        self.store.put(state.clone())?;

        PIPELINES_COMPLETED.inc();
        info!(ticket_id = %ticket_id, "Pipeline completed");
        self.hub.publish(PipelineEvent::ProcessingComplete {
            message: format!("Ticket {} processed successfully", ticket_id),
            ticket: state,
        });
        self.emit(AuditEvent::PipelineCompleted { ticket_id }).await;
        Ok(())
    }

    /// Run the processor for `kind` in its own task so a panic or a hang
    /// cannot take the engine down with it.
    async fn invoke(
        &self,
        kind: StageKind,
        ticket: Ticket,
        ctx: StageContext,
    ) -> Result<StageOutcome, ProcessorFault> {
        let processor = self.registry.get(kind).ok_or_else(|| {
            ProcessorFault::Unavailable(format!("no processor registered for stage {}", kind))
        })?;

        let timeout = self.config.stage_timeout();
        let mut task = tokio::spawn(async move { processor.process(ticket, &ctx).await });

        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => Err(ProcessorFault::Panicked(
                panic_message(join_error.into_panic()),
            )),
            Ok(Err(_)) => Err(ProcessorFault::Failed(
                "processor task was cancelled".to_string(),
            )),
            Err(_) => {
                task.abort();
                Err(ProcessorFault::Timeout(timeout))
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn load(&self, ticket_id: &str) -> Result<TicketState, EngineError> {
        self.store
            .get(ticket_id)?
            .ok_or_else(|| EngineError::NotFound(ticket_id.to_string()))
    }

    /// Store the full state and publish it.
    fn save(&self, mut state: TicketState) -> Result<(), EngineError> {
        state.updated_at = Utc::now();
        self.store.put(state.clone())?;
        self.hub.publish(PipelineEvent::TicketUpdate { ticket: state });
        Ok(())
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.emit(event).await;
        }
    }
}

fn ensure_waiting(state: &TicketState) -> Result<(), EngineError> {
    if state.waiting_for_review {
        Ok(())
    } else {
        Err(EngineError::InvalidState {
            ticket_id: state.ticket.id.clone(),
            reason: "ticket is not waiting for review".to_string(),
        })
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
