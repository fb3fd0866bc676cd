//! Governance tickets and their pipeline state.

mod memory_store;
mod store;
mod types;

pub use memory_store::InMemoryTicketStore;
pub use store::{TicketError, TicketStore};
pub use types::{
    EvidenceRecord, PipelineStatus, RiskLevel, Stage, StageKind, StageStatus, Ticket, TicketState,
};
