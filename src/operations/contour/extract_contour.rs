use super::reduce_envelope::{ContourType, ReduceEnvelope};
use crate::error::{Result, SliceError};
use crate::geometry::{PointCloud, Polyline};
use crate::math::Point3;
use crate::operations::slice::SliceProfile;

/// Which 3D position a contour vertex is restored to after 2D reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourVertices {
    /// The untouched source point.
    #[default]
    SourcePoint,
    /// The source point projected onto the section line, height kept.
    SectionPlane,
}

/// A contour polyline and, for each vertex, the profile entry it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub polyline: Polyline,
    /// Index into the slice profile of each vertex.
    pub source_indices: Vec<usize>,
}

/// Reduces a slice profile to an envelope contour in unrolled space, then
/// moves every contour vertex back to a 3D position.
#[derive(Debug)]
pub struct ExtractContour<'a> {
    profile: &'a SliceProfile,
    max_edge_length: f64,
    contour_type: ContourType,
    vertices: ContourVertices,
}

impl<'a> ExtractContour<'a> {
    /// Creates a new contour extraction.
    #[must_use]
    pub fn new(profile: &'a SliceProfile, max_edge_length: f64, contour_type: ContourType) -> Self {
        Self {
            profile,
            max_edge_length,
            contour_type,
            vertices: ContourVertices::default(),
        }
    }

    #[must_use]
    pub fn with_vertices(mut self, vertices: ContourVertices) -> Self {
        self.vertices = vertices;
        self
    }

    /// Executes the extraction. `clouds` must be the cloud set the profile was
    /// classified from. Returns `None` when the profile holds fewer than 2
    /// points or the envelope collapses to a single vertex.
    ///
    /// # Errors
    ///
    /// - `SliceError::InternalConsistency` if the profile buffers disagree, if
    ///   the reduced vertex count differs from its back-reference count, or if
    ///   a back-reference does not resolve
    /// - `InputError::NonPositiveParameter` if the max edge length is negative
    pub fn execute(&self, clouds: &[PointCloud]) -> Result<Option<Contour>> {
        self.profile.check_consistency()?;
        if self.profile.len() < 2 {
            return Ok(None);
        }

        let Some(reduced) =
            ReduceEnvelope::new(self.profile.unrolled(), self.max_edge_length, self.contour_type)
                .execute()?
        else {
            return Ok(None);
        };

        if reduced.source_indices.len() != reduced.vertices.len() {
            return Err(SliceError::InternalConsistency(format!(
                "contour has {} vertices but {} source indices",
                reduced.vertices.len(),
                reduced.source_indices.len()
            ))
            .into());
        }

        let mut vertices = Vec::with_capacity(reduced.source_indices.len());
        for &i in &reduced.source_indices {
            vertices.push(self.restore(i, clouds)?);
        }

        Ok(Some(Contour {
            polyline: Polyline::new(vertices, reduced.closed),
            source_indices: reduced.source_indices,
        }))
    }

    fn restore(&self, i: usize, clouds: &[PointCloud]) -> Result<Point3, SliceError> {
        let unresolved = || {
            SliceError::InternalConsistency(format!("contour vertex refers to missing point {i}"))
        };
        match self.vertices {
            ContourVertices::SectionPlane => self
                .profile
                .positions()
                .get(i)
                .copied()
                .ok_or_else(unresolved),
            ContourVertices::SourcePoint => {
                let source = self.profile.sources().get(i).ok_or_else(unresolved)?;
                clouds
                    .get(source.cloud)
                    .and_then(|c| c.points.get(source.index))
                    .copied()
                    .ok_or_else(unresolved)
            }
        }
    }
}
