pub mod contour;
pub mod extract;
pub mod sample;
pub mod sections;
pub mod slice;
