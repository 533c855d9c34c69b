use crate::buffer::{push_with_growth, reserve_to, GrowthPolicy};
use crate::error::SliceError;
use crate::math::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Bounding box of `points`, or `None` if there are none.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let first = points.first()?;
        let mut bb = Self {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bb.min = bb.min.inf(p);
            bb.max = bb.max.sup(p);
        }
        Some(bb)
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Largest extent over the three dimensions.
    #[must_use]
    pub fn max_dim(&self) -> f64 {
        (self.max - self.min).max()
    }
}

/// A named, ordered set of 3D points.
///
/// Extraction never mutates a source cloud; it produces new clouds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub name: String,
    pub points: Vec<Point3>,
}

impl PointCloud {
    /// Creates a cloud from its points.
    #[must_use]
    pub fn new(name: impl Into<String>, points: Vec<Point3>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.points)
    }

    /// Copies the points selected by `selection` into a new cloud.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the copy cannot be allocated,
    /// or `SliceError::InternalConsistency` if the selection refers past the
    /// end of this cloud.
    pub fn partial_clone(
        &self,
        selection: &ReferenceCloud,
        name: impl Into<String>,
    ) -> Result<PointCloud, SliceError> {
        let mut points = Vec::new();
        reserve_to(&mut points, selection.len())?;
        for &i in selection.indices() {
            let p = self.points.get(i).ok_or_else(|| {
                SliceError::InternalConsistency(format!(
                    "selection index {i} out of range for cloud of {} points",
                    self.points.len()
                ))
            })?;
            points.push(*p);
        }
        Ok(PointCloud::new(name, points))
    }

    /// Appends all points of `other`.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the cloud cannot grow.
    pub fn append(&mut self, other: &PointCloud) -> Result<(), SliceError> {
        let target = self.points.len() + other.points.len();
        reserve_to(&mut self.points, target)?;
        self.points.extend_from_slice(&other.points);
        Ok(())
    }
}

/// Selection of point indices into a source cloud. Nothing is copied until
/// [`PointCloud::partial_clone`] materializes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCloud {
    indices: Vec<usize>,
}

impl ReferenceCloud {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point index, growing under `policy` when full.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the selection cannot grow.
    pub fn push(&mut self, index: usize, policy: &GrowthPolicy) -> Result<(), SliceError> {
        push_with_growth(&mut self.indices, index, policy)
    }

    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
