mod extract_sections;
mod params;
mod progress;

pub use extract_sections::{BatchReport, ExtractSections, SliceFailure, SliceOutput};
pub use params::ExtractionParams;
pub use progress::{CancelToken, NoProgress, ProgressSink, SliceProgress};
