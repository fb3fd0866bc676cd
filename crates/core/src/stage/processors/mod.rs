//! Built-in stage processors.

mod category;
mod closure;
mod evidence;
mod fixture;
mod logging;
mod owner_space;
mod ownership;
mod sla;

pub use category::CategoryProcessor;
pub use closure::ClosureProcessor;
pub use evidence::EvidenceProcessor;
pub use fixture::FixtureProcessor;
pub use logging::LoggingProcessor;
pub use owner_space::OwnerSpaceProcessor;
pub use ownership::OwnershipProcessor;
pub use sla::{parse_deadline, SlaProcessor};
