#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use super::profile::{PointRef, SliceProfile};
use crate::buffer::GrowthPolicy;
use crate::error::{InputError, Result, SliceError};
use crate::geometry::{PointCloud, Polyline, ReferenceCloud};
use crate::math::segment_2d::project_on_span;
use crate::math::{Point3, VerticalAxis};
use crate::operations::extract::CancelToken;
use crate::operations::sample::{PolylineSampling, SamplePolyline};

/// What a slice pass should collect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceTargets {
    /// Collect index selections into each source cloud.
    pub references: bool,
    /// Collect projected/unrolled point pairs for contour extraction.
    pub profile: bool,
}

impl Default for SliceTargets {
    fn default() -> Self {
        Self {
            references: false,
            profile: true,
        }
    }
}

/// Points of every input cloud lying within the thickness band of a polyline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Slice {
    /// One selection per input cloud, in input order. Empty when references
    /// were not requested.
    pub references: Vec<ReferenceCloud>,
    /// Projected and unrolled points over all clouds, in cloud order.
    pub profile: Option<SliceProfile>,
}

impl Slice {
    /// Total number of selected points over all clouds.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.iter().map(ReferenceCloud::len).sum()
    }
}

/// Classifies cloud points by their flattened distance to a polyline.
///
/// # Algorithm
///
/// For each non-degenerate segment `AB` (flattened onto the plane orthogonal
/// to the vertical axis), with unit direction `u`, each point `P` is projected
/// to `ps = u . AP`. The point is claimed by the segment only if
/// `0 <= ps <= |AB|` and `|AP - u * ps|^2 <= T^2`.
///
/// Segments that are vertical once flattened are skipped and add nothing to
/// the unrolled abscissa.
///
/// A point near a joint may be claimed by several segments; it is then
/// recorded once per claiming segment. No deduplication is performed.
///
/// Segments are visited in polyline order for each cloud so that the
/// abscissa attributed to a point does not depend on scheduling; with the
/// `parallel` feature, clouds are classified concurrently into independent
/// buffers and merged in input order.
#[derive(Debug)]
pub struct ClassifySlice<'a> {
    polyline: &'a Polyline,
    axis: VerticalAxis,
    thickness: f64,
    targets: SliceTargets,
    growth: GrowthPolicy,
    cancel: Option<&'a CancelToken>,
}

impl<'a> ClassifySlice<'a> {
    /// Creates a new classification with half-thickness `thickness`.
    #[must_use]
    pub fn new(polyline: &'a Polyline, axis: VerticalAxis, thickness: f64) -> Self {
        Self {
            polyline,
            axis,
            thickness,
            targets: SliceTargets::default(),
            growth: GrowthPolicy::default(),
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_targets(mut self, targets: SliceTargets) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.growth = growth;
        self
    }

    /// Checks `cancel` before each segment. A cancelled pass drops its buffers.
    #[must_use]
    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Executes the classification over `clouds`.
    ///
    /// # Errors
    ///
    /// - `InputError::TooFewVertices` if the polyline has fewer than 2 vertices
    /// - `InputError::EmptyCloudSet` if `clouds` is empty
    /// - `InputError::NonPositiveParameter` if the thickness is not positive
    /// - `SliceError::AllocationFailure` if a buffer cannot grow
    /// - `SliceError::Cancelled` if the cancel token fired
    pub fn execute(&self, clouds: &[PointCloud]) -> Result<Slice> {
        self.polyline.validate()?;
        if clouds.is_empty() {
            return Err(InputError::EmptyCloudSet.into());
        }
        InputError::check_positive("thickness", self.thickness)?;

        let sampling = SamplePolyline::new(self.polyline, self.axis).execute()?;

        #[cfg(feature = "parallel")]
        let parts: Vec<CloudPart> = clouds
            .par_iter()
            .enumerate()
            .map(|(c, cloud)| self.classify_cloud(&sampling, c, cloud))
            .collect::<Result<_, SliceError>>()?;

        #[cfg(not(feature = "parallel"))]
        let parts: Vec<CloudPart> = clouds
            .iter()
            .enumerate()
            .map(|(c, cloud)| self.classify_cloud(&sampling, c, cloud))
            .collect::<Result<_, SliceError>>()?;

        let mut slice = Slice::default();
        let mut profile = self.targets.profile.then(SliceProfile::new);
        for part in parts {
            if let Some(references) = part.references {
                slice.references.push(references);
            }
            if let (Some(profile), Some(part_profile)) = (profile.as_mut(), part.profile) {
                profile.append(part_profile)?;
            }
        }
        slice.profile = profile;
        Ok(slice)
    }

    fn classify_cloud(
        &self,
        sampling: &PolylineSampling,
        cloud_index: usize,
        cloud: &PointCloud,
    ) -> Result<CloudPart, SliceError> {
        let thickness_sq = self.thickness * self.thickness;
        let mut references = self.targets.references.then(ReferenceCloud::new);
        let mut profile = self.targets.profile.then(SliceProfile::new);

        for seg in &sampling.segments {
            if self.cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(SliceError::Cancelled);
            }
            for (index, p) in cloud.points.iter().enumerate() {
                let p_2d = self.axis.flatten(p);
                let Some(proj) =
                    project_on_span(&p_2d, &seg.start_2d, &seg.direction, seg.flat_length)
                else {
                    continue;
                };
                if proj.dist_sq > thickness_sq {
                    continue;
                }

                if let Some(references) = references.as_mut() {
                    references.push(index, &self.growth)?;
                }
                if let Some(profile) = profile.as_mut() {
                    let height = self.axis.height(p);
                    let on_line = seg.start_2d + seg.direction * proj.along;
                    profile.push(
                        self.axis.lift(on_line, height),
                        Point3::new(seg.abscissa + proj.along, height, 0.0),
                        PointRef {
                            cloud: cloud_index,
                            index,
                        },
                        &self.growth,
                    )?;
                }
            }
        }

        debug!(
            cloud = %cloud.name,
            selected = references.as_ref().map_or(0, ReferenceCloud::len),
            profiled = profile.as_ref().map_or(0, SliceProfile::len),
            "classified cloud"
        );
        Ok(CloudPart {
            references,
            profile,
        })
    }
}

/// Per-cloud output, merged by [`ClassifySlice::execute`].
struct CloudPart {
    references: Option<ReferenceCloud>,
    profile: Option<SliceProfile>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SectionError;
    use approx::assert_relative_eq;

    fn straight_x() -> Polyline {
        Polyline::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)],
            false,
        )
    }

    fn both() -> SliceTargets {
        SliceTargets {
            references: true,
            profile: true,
        }
    }

    #[test]
    fn band_includes_near_point_and_excludes_far_point() {
        let poly = straight_x();
        let cloud = PointCloud::new(
            "c",
            vec![Point3::new(5.0, 0.3, 2.0), Point3::new(5.0, 1.0, 2.0)],
        );
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_targets(both())
            .execute(&[cloud])
            .unwrap();
        assert_eq!(slice.references[0].indices(), &[0]);

        let profile = slice.profile.unwrap();
        assert_eq!(profile.len(), 1);
        assert_relative_eq!(profile.positions()[0], Point3::new(5.0, 0.0, 2.0));
        assert_relative_eq!(profile.unrolled()[0], Point3::new(5.0, 2.0, 0.0));
    }

    #[test]
    fn no_extension_past_endpoints() {
        let poly = straight_x();
        let cloud = PointCloud::new(
            "c",
            vec![
                Point3::new(-0.1, 0.0, 0.0),
                Point3::new(10.1, 0.0, 0.0),
                Point3::new(0.0, 0.2, 0.0),
                Point3::new(10.0, -0.2, 0.0),
            ],
        );
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_targets(both())
            .execute(&[cloud])
            .unwrap();
        assert_eq!(slice.references[0].indices(), &[2, 3]);
    }

    #[test]
    fn joint_points_are_claimed_by_each_segment() {
        // L-shaped path; the corner point lies on both segments' spans.
        let poly = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(4.0, 4.0, 0.0),
            ],
            false,
        );
        let cloud = PointCloud::new("c", vec![Point3::new(3.9, 0.1, 1.0)]);
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_targets(both())
            .execute(&[cloud])
            .unwrap();
        assert_eq!(slice.references[0].indices(), &[0, 0]);

        let profile = slice.profile.unwrap();
        assert_relative_eq!(profile.unrolled()[0].x, 3.9, epsilon = 1e-12);
        assert_relative_eq!(profile.unrolled()[1].x, 4.1, epsilon = 1e-12);
    }

    #[test]
    fn closed_polyline_wraparound_continues_abscissa() {
        let poly = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(3.0, 4.0, 0.0),
            ],
            true,
        );
        // Midpoint of the closing segment (3,4) -> (0,0).
        let cloud = PointCloud::new("c", vec![Point3::new(1.5, 2.0, 0.0)]);
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.01)
            .execute(&[cloud])
            .unwrap();
        let profile = slice.profile.unwrap();
        assert_eq!(profile.len(), 1);
        assert_relative_eq!(profile.unrolled()[0].x, 9.5, epsilon = 1e-12);
    }

    #[test]
    fn vertical_segment_leaves_abscissa_unchanged() {
        let poly = Polyline::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 5.0),
                Point3::new(10.0, 0.0, 5.0),
            ],
            false,
        );
        let cloud = PointCloud::new("c", vec![Point3::new(1.0, 0.1, 0.0)]);
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .execute(&[cloud])
            .unwrap();
        let profile = slice.profile.unwrap();
        assert_eq!(profile.len(), 1);
        assert_relative_eq!(profile.unrolled()[0], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn profile_spans_all_clouds_in_order() {
        let poly = straight_x();
        let a = PointCloud::new("a", vec![Point3::new(1.0, 0.0, 0.0)]);
        let b = PointCloud::new(
            "b",
            vec![Point3::new(9.0, 5.0, 0.0), Point3::new(2.0, 0.1, 3.0)],
        );
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_targets(both())
            .execute(&[a, b])
            .unwrap();
        assert_eq!(slice.references.len(), 2);
        assert_eq!(slice.reference_count(), 2);
        let sources = slice.profile.unwrap().sources().to_vec();
        assert_eq!(
            sources,
            vec![
                PointRef { cloud: 0, index: 0 },
                PointRef { cloud: 1, index: 1 }
            ]
        );
    }

    #[test]
    fn vertical_axis_x() {
        // Vertical = X, plane = (Y, Z). Path along Y at Z = 0.
        let poly = Polyline::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 10.0, 0.0)],
            false,
        );
        let cloud = PointCloud::new(
            "c",
            vec![Point3::new(7.0, 5.0, 0.3), Point3::new(7.0, 5.0, 1.0)],
        );
        let slice = ClassifySlice::new(&poly, VerticalAxis::X, 0.5)
            .execute(&[cloud])
            .unwrap();
        let profile = slice.profile.unwrap();
        assert_eq!(profile.len(), 1);
        assert_relative_eq!(profile.positions()[0], Point3::new(7.0, 5.0, 0.0));
        assert_relative_eq!(profile.unrolled()[0], Point3::new(5.0, 7.0, 0.0));
    }

    #[test]
    fn degenerate_inputs_select_nothing() {
        let poly = Polyline::new(
            vec![Point3::new(1.0, 1.0, 0.0), Point3::new(1.0, 1.0, 3.0)],
            false,
        );
        let cloud = PointCloud::new("c", vec![Point3::new(1.0, 1.0, 1.0)]);
        let slice = ClassifySlice::new(&poly, VerticalAxis::Z, 1.0)
            .with_targets(both())
            .execute(&[cloud, PointCloud::default()])
            .unwrap();
        assert_eq!(slice.reference_count(), 0);
        assert!(slice.profile.unwrap().is_empty());
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let poly = straight_x();
        let cloud = PointCloud::new("c", vec![Point3::origin()]);

        let err = ClassifySlice::new(&poly, VerticalAxis::Z, 1.0)
            .execute(&[])
            .unwrap_err();
        assert!(matches!(err, SectionError::Input(InputError::EmptyCloudSet)));

        let err = ClassifySlice::new(&poly, VerticalAxis::Z, 0.0)
            .execute(std::slice::from_ref(&cloud))
            .unwrap_err();
        assert!(matches!(
            err,
            SectionError::Input(InputError::NonPositiveParameter { .. })
        ));

        let short = Polyline::new(vec![Point3::origin()], false);
        let err = ClassifySlice::new(&short, VerticalAxis::Z, 1.0)
            .execute(&[cloud])
            .unwrap_err();
        assert!(matches!(
            err,
            SectionError::Input(InputError::TooFewVertices { count: 1 })
        ));
    }

    #[test]
    fn cancelled_token_aborts_pass() {
        let poly = straight_x();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_cancel(&cancel)
            .execute(&[PointCloud::new("c", vec![Point3::origin()])])
            .unwrap_err();
        assert!(matches!(err, SectionError::Slice(SliceError::Cancelled)));
    }

    #[test]
    fn capacity_limit_yields_allocation_failure() {
        let poly = straight_x();
        let points = (0..10_000)
            .map(|i| Point3::new(f64::from(i % 100) * 0.1, 0.0, f64::from(i / 100)))
            .collect();
        let cloud = PointCloud::new("dense", points);
        let err = ClassifySlice::new(&poly, VerticalAxis::Z, 0.5)
            .with_targets(both())
            .with_growth(GrowthPolicy::default().with_capacity_limit(1_000))
            .execute(&[cloud])
            .unwrap_err();
        assert!(matches!(
            err,
            SectionError::Slice(SliceError::AllocationFailure { .. })
        ));
    }
}
