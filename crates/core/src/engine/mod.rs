//! Stage pipeline engine.
//!
//! The engine owns every ticket transition:
//! - **Ingestion**: loads eligible tickets into the store
//! - **Runs**: executes stages in order until completion, a halt, or the review gate
//! - **Review**: approval completes the gate stage and resumes the run

mod config;
mod locks;
mod runner;
mod types;

pub use config::EngineConfig;
pub use runner::{PipelineEngine, REVIEW_APPROVED_MESSAGE, REVIEW_WAITING_MESSAGE};
pub use types::{EngineError, RunOutcome};
