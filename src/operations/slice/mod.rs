mod classify_slice;
mod profile;

pub use classify_slice::{ClassifySlice, Slice, SliceTargets};
pub use profile::{PointRef, SliceProfile};
