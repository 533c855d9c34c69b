use crate::error::InputError;
use crate::geometry::metadata::Metadata;
use crate::math::Point3;

/// An ordered sequence of 3D vertices joined by straight segments.
///
/// For closed polylines, the last vertex connects back to the first.
/// When `mode_2d` is set, vertices are still stored in 3D but their vertical
/// coordinate is meaningless until the polyline is lifted (see
/// [`SectionPool::add_polyline`](crate::session::SectionPool::add_polyline)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polyline {
    pub name: String,
    pub vertices: Vec<Point3>,
    pub closed: bool,
    pub mode_2d: bool,
    pub metadata: Metadata,
}

impl Polyline {
    /// Creates an unnamed 3D polyline.
    #[must_use]
    pub fn new(vertices: Vec<Point3>, closed: bool) -> Self {
        Self {
            vertices,
            closed,
            ..Self::default()
        }
    }

    /// Sets the name of this polyline.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the number of segments in this polyline.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        let n = self.vertices.len();
        if n < 2 {
            return 0;
        }
        if self.closed {
            n
        } else {
            n - 1
        }
    }

    /// Returns the endpoints of segment `i`. The closing segment of a closed
    /// polyline wraps to vertex 0.
    #[must_use]
    pub fn segment(&self, i: usize) -> Option<(Point3, Point3)> {
        if i >= self.segment_count() {
            return None;
        }
        let n = self.vertices.len();
        Some((self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Total 3D length over all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        (0..self.segment_count())
            .filter_map(|i| self.segment(i))
            .map(|(a, b)| (b - a).norm())
            .sum()
    }

    /// Checks that this polyline has enough vertices to be sliced along.
    ///
    /// # Errors
    ///
    /// Returns `InputError::TooFewVertices` if there are fewer than 2 vertices.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.vertices.len() < 2 {
            return Err(InputError::TooFewVertices {
                count: self.vertices.len(),
            });
        }
        Ok(())
    }
}
