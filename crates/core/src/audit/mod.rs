//! Run log: structured records of everything the pipeline did.

mod events;
mod handle;
mod memory;
mod store;
mod writer;

pub use events::*;
pub use handle::*;
pub use memory::InMemoryAuditStore;
pub use store::*;
pub use writer::*;
