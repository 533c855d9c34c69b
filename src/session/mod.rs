mod pool;
mod section;

pub use pool::{OrthoGeneration, PoolExtraction, SectionPool};
pub use section::{Section, SectionId, SectionState};
