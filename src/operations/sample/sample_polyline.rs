use tracing::debug;

use crate::error::Result;
use crate::geometry::Polyline;
use crate::math::{Point2, Point3, Vector2, Vector3, VerticalAxis, ZERO_TOLERANCE};

/// One non-degenerate segment of a sampled polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentSample {
    /// Index of the segment in the polyline (wraparound segment included).
    pub index: usize,
    pub start: Point3,
    pub end: Point3,
    /// `start` projected onto the flattened plane.
    pub start_2d: Point2,
    /// Unit direction of the segment in the flattened plane.
    pub direction: Vector2,
    /// Length of the segment in the flattened plane.
    pub flat_length: f64,
    /// 3D length of the segment.
    pub length: f64,
    /// Unit normal to the segment within the flattened plane, as a 3D vector
    /// with a zero vertical component. Equals `flat(AB) x up`, normalized.
    pub normal: Vector3,
    /// Curvilinear abscissa of `start`.
    pub abscissa: f64,
}

impl SegmentSample {
    /// Segment vector with its vertical component zeroed.
    #[must_use]
    pub fn flat_vector(&self, axis: VerticalAxis) -> Vector3 {
        axis.flatten_vector(self.end - self.start)
    }
}

/// How segments that are degenerate once flattened count towards the abscissa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegenerateSegments {
    /// They contribute nothing: the abscissa measures the sliced path only.
    #[default]
    Ignore,
    /// They add their 3D length, so the abscissa is the full path length.
    Advance,
}

/// Per-segment frames of a polyline, ready for slicing or section generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineSampling {
    pub axis: VerticalAxis,
    /// Non-degenerate segments, in traversal order.
    pub segments: Vec<SegmentSample>,
    /// Number of segments in the polyline, degenerate ones included.
    pub segment_count: usize,
    /// Total 3D length of the polyline, degenerate segments included.
    pub total_length: f64,
}

/// Walks a polyline's segments and computes their flattened frames and
/// running curvilinear abscissa.
///
/// The abscissa accumulates the 3D length of every non-degenerate segment
/// from vertex 0, so a closed polyline's wraparound segment continues from
/// the open-path length. Segments whose flattened length is below
/// [`ZERO_TOLERANCE`] are skipped; whether they advance the abscissa is
/// set by [`DegenerateSegments`].
#[derive(Debug)]
pub struct SamplePolyline<'a> {
    polyline: &'a Polyline,
    axis: VerticalAxis,
    degenerate: DegenerateSegments,
}

impl<'a> SamplePolyline<'a> {
    /// Creates a new sampling operation.
    #[must_use]
    pub fn new(polyline: &'a Polyline, axis: VerticalAxis) -> Self {
        Self {
            polyline,
            axis,
            degenerate: DegenerateSegments::default(),
        }
    }

    #[must_use]
    pub fn with_degenerate(mut self, degenerate: DegenerateSegments) -> Self {
        self.degenerate = degenerate;
        self
    }

    /// Executes the sampling.
    ///
    /// # Errors
    ///
    /// Returns `InputError::TooFewVertices` if the polyline has fewer than 2 vertices.
    pub fn execute(&self) -> Result<PolylineSampling> {
        self.polyline.validate()?;

        let up = self.axis.unit();
        let segment_count = self.polyline.segment_count();
        let mut segments = Vec::with_capacity(segment_count);
        let mut abscissa = 0.0;
        let mut total_length = 0.0;

        for index in 0..segment_count {
            let Some((start, end)) = self.polyline.segment(index) else {
                continue;
            };
            let length = (end - start).norm();
            let start_2d = self.axis.flatten(&start);
            let ab_2d = self.axis.flatten(&end) - start_2d;
            let flat_length = ab_2d.norm();
            total_length += length;

            if flat_length < ZERO_TOLERANCE {
                debug!(index, length, "skipping degenerate segment");
                if self.degenerate == DegenerateSegments::Advance {
                    abscissa += length;
                }
                continue;
            }

            let normal = self.axis.flatten_vector(end - start).cross(&up) / flat_length;
            segments.push(SegmentSample {
                index,
                start,
                end,
                start_2d,
                direction: ab_2d / flat_length,
                flat_length,
                length,
                normal,
                abscissa,
            });
            abscissa += length;
        }

        Ok(PolylineSampling {
            axis: self.axis,
            segments,
            segment_count,
            total_length,
        })
    }
}
