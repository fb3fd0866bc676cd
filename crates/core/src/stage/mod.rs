//! Stage processors and the registry the engine dispatches through.

pub mod processors;
mod registry;
mod traits;

pub use registry::StageRegistry;
pub use traits::{ProcessorFault, StageContext, StageOutcome, StageProcessor};
