use crate::buffer::{reserve_to, GrowthPolicy};
use crate::error::SliceError;
use crate::math::Point3;

/// Location of a point in the input cloud set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointRef {
    pub cloud: usize,
    pub index: usize,
}

/// Parallel buffers describing the points of a slice for contour extraction.
///
/// Entry `i` of every buffer refers to the same source point:
/// - `positions[i]`: the point projected onto the section line in the
///   flattened plane, vertical coordinate kept;
/// - `unrolled[i]`: `(abscissa, height, 0)`;
/// - `sources[i]`: where the point came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceProfile {
    positions: Vec<Point3>,
    unrolled: Vec<Point3>,
    sources: Vec<PointRef>,
}

impl SliceProfile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a profile from existing buffers.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::InternalConsistency` if the buffers differ in length.
    pub fn from_parts(
        positions: Vec<Point3>,
        unrolled: Vec<Point3>,
        sources: Vec<PointRef>,
    ) -> Result<Self, SliceError> {
        let profile = Self {
            positions,
            unrolled,
            sources,
        };
        profile.check_consistency()?;
        Ok(profile)
    }

    /// Adds one point to every buffer, growing them together under `policy`.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the buffers cannot grow.
    pub fn push(
        &mut self,
        position: Point3,
        unrolled: Point3,
        source: PointRef,
        policy: &GrowthPolicy,
    ) -> Result<(), SliceError> {
        let capacity = self
            .positions
            .capacity()
            .min(self.unrolled.capacity())
            .min(self.sources.capacity());
        let target = policy.ensure_room(self.positions.len(), capacity)?;
        reserve_to(&mut self.positions, target)?;
        reserve_to(&mut self.unrolled, target)?;
        reserve_to(&mut self.sources, target)?;

        self.positions.push(position);
        self.unrolled.push(unrolled);
        self.sources.push(source);
        Ok(())
    }

    /// Appends all entries of `other`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::AllocationFailure` if the buffers cannot grow.
    pub fn append(&mut self, other: SliceProfile) -> Result<(), SliceError> {
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        let target = self.len() + other.len();
        reserve_to(&mut self.positions, target)?;
        reserve_to(&mut self.unrolled, target)?;
        reserve_to(&mut self.sources, target)?;
        self.positions.extend(other.positions);
        self.unrolled.extend(other.unrolled);
        self.sources.extend(other.sources);
        Ok(())
    }

    /// Verifies that the parallel buffers have equal lengths.
    ///
    /// # Errors
    ///
    /// Returns `SliceError::InternalConsistency` on mismatch.
    pub fn check_consistency(&self) -> Result<(), SliceError> {
        let (p, u, s) = (self.positions.len(), self.unrolled.len(), self.sources.len());
        if p != u || p != s {
            return Err(SliceError::InternalConsistency(format!(
                "slice buffers differ in length ({p} projected, {u} unrolled, {s} sources)"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    #[must_use]
    pub fn unrolled(&self) -> &[Point3] {
        &self.unrolled
    }

    #[must_use]
    pub fn sources(&self) -> &[PointRef] {
        &self.sources
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
