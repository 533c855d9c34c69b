pub mod cloud;
pub mod metadata;
pub mod polyline;

pub use cloud::{Aabb, PointCloud, ReferenceCloud};
pub use metadata::{keys, MetaValue, Metadata, ProfileFrame};
pub use polyline::Polyline;
