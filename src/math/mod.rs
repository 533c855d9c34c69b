pub mod axis;
pub mod segment_2d;

pub use axis::VerticalAxis;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Length under which a segment is treated as degenerate.
pub const ZERO_TOLERANCE: f64 = 1e-10;
