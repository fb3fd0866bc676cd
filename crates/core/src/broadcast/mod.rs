//! Real-time event fan-out.

mod events;
mod hub;

pub use events::{FailureKind, PipelineEvent};
pub use hub::{BroadcastHub, SubscriberId, Subscription};
