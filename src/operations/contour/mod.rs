mod extract_contour;
mod reduce_envelope;

pub use extract_contour::{Contour, ContourVertices, ExtractContour};
pub use reduce_envelope::{ContourType, ReduceEnvelope, ReducedContour};
