use tracing::{info, warn};

use super::params::ExtractionParams;
use super::progress::{CancelToken, ProgressSink, SliceProgress};
use crate::error::{ErrorKind, InputError, Result, SectionError, SliceError};
use crate::geometry::{PointCloud, Polyline, ReferenceCloud};
use crate::operations::contour::{Contour, ExtractContour};
use crate::operations::slice::{ClassifySlice, SliceTargets};

/// Products of one successful slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceOutput {
    /// Position of the section in the batch input.
    pub section: usize,
    /// Extracted clouds: one fused cloud, or one per source cloud with points.
    pub clouds: Vec<PointCloud>,
    pub contour: Option<Contour>,
}

/// A slice that failed. The rest of the batch is unaffected.
#[derive(Debug)]
pub struct SliceFailure {
    pub section: usize,
    pub error: SectionError,
}

/// Outcome of a batch extraction.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outputs: Vec<SliceOutput>,
    pub failures: Vec<SliceFailure>,
    /// Sections with fewer than 2 vertices, left out of the batch.
    pub skipped: usize,
    /// The batch stopped early on a cancellation request.
    pub cancelled: bool,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outputs.len()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn generated_clouds(&self) -> usize {
        self.outputs.iter().map(|o| o.clouds.len()).sum()
    }

    #[must_use]
    pub fn generated_contours(&self) -> usize {
        self.outputs.iter().filter(|o| o.contour.is_some()).count()
    }
}

/// Extracts section clouds and/or contours for a set of sections.
///
/// Slices are processed one after the other. A slice that fails (allocation
/// failure, internal inconsistency) is recorded in the report and the batch
/// moves on, unless [`ExtractionParams::halt_on_error`] is set. Cancellation
/// is honored between slices and between segments of a slice; the slice in
/// flight is discarded.
#[derive(Debug)]
pub struct ExtractSections<'a> {
    sections: Vec<&'a Polyline>,
    clouds: &'a [PointCloud],
    params: ExtractionParams,
}

impl<'a> ExtractSections<'a> {
    /// Creates a new batch over `sections` and `clouds`.
    #[must_use]
    pub fn new(
        sections: impl IntoIterator<Item = &'a Polyline>,
        clouds: &'a [PointCloud],
        params: ExtractionParams,
    ) -> Self {
        Self {
            sections: sections.into_iter().collect(),
            clouds,
            params,
        }
    }

    /// Executes the batch.
    ///
    /// # Errors
    ///
    /// Only input validation fails the whole batch:
    /// - `InputError::EmptyCloudSet` if there is no cloud
    /// - `InputError::NoValidSection` if no section has at least 2 vertices
    /// - parameter errors from [`ExtractionParams::validate`]
    pub fn execute(
        &self,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<BatchReport> {
        self.params.validate()?;
        if self.clouds.is_empty() {
            return Err(InputError::EmptyCloudSet.into());
        }

        let eligible: Vec<(usize, &Polyline)> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, poly)| poly.vertices.len() >= 2)
            .map(|(i, poly)| (i, *poly))
            .collect();
        if eligible.is_empty() {
            return Err(InputError::NoValidSection.into());
        }

        let mut report = BatchReport {
            skipped: self.sections.len() - eligible.len(),
            ..BatchReport::default()
        };
        let total = eligible.len();
        info!(
            sections = total,
            points = self.clouds.iter().map(PointCloud::len).sum::<usize>(),
            "extracting sections"
        );

        for (processed, &(section, poly)) in eligible.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            match self.extract_slice(section, poly, cancel) {
                Ok(output) => report.outputs.push(output),
                Err(error) if error.kind() == ErrorKind::Cancelled => {
                    report.cancelled = true;
                    break;
                }
                Err(error) => {
                    warn!(section = section + 1, %error, "section extraction failed");
                    report.failures.push(SliceFailure { section, error });
                    if self.params.halt_on_error {
                        break;
                    }
                }
            }

            progress.on_progress(SliceProgress {
                processed: processed + 1,
                total,
            });
        }

        if report.cancelled {
            warn!(done = report.succeeded(), "extraction cancelled");
        }
        info!(
            contours = report.generated_contours(),
            clouds = report.generated_clouds(),
            failed = report.failed(),
            "extraction done"
        );
        Ok(report)
    }

    fn extract_slice(
        &self,
        section: usize,
        poly: &Polyline,
        cancel: &CancelToken,
    ) -> Result<SliceOutput> {
        let number = section + 1;
        let params = &self.params;
        let slice = ClassifySlice::new(poly, params.axis, params.thickness)
            .with_targets(SliceTargets {
                references: params.extract_clouds,
                profile: params.extract_contours,
            })
            .with_growth(params.growth)
            .with_cancel(cancel)
            .execute(self.clouds)?;

        let mut contour = None;
        if let Some(profile) = slice.profile.as_ref() {
            if profile.len() < 2 {
                warn!(
                    section = number,
                    points = profile.len(),
                    "section contains fewer than 2 points and will be ignored"
                );
            } else {
                contour = ExtractContour::new(profile, params.max_edge_length, params.contour_type)
                    .with_vertices(params.contour_vertices)
                    .execute(self.clouds)?
                    .map(|mut c| {
                        c.polyline.name = format!("Section contour #{number}");
                        c.polyline.metadata.extend_from(&poly.metadata);
                        c
                    });
            }
        }

        let clouds = if params.extract_clouds {
            self.materialize(number, &slice.references)?
        } else {
            Vec::new()
        };

        Ok(SliceOutput {
            section,
            clouds,
            contour,
        })
    }

    /// Copies the selected points out of their source clouds.
    fn materialize(
        &self,
        number: usize,
        references: &[ReferenceCloud],
    ) -> Result<Vec<PointCloud>, SliceError> {
        let mut parts = Vec::new();
        for (source, selection) in self.clouds.iter().zip(references) {
            if selection.is_empty() {
                continue;
            }
            let name = if self.params.combine_clouds {
                format!("Section cloud #{number}")
            } else {
                format!("Section cloud #{number} ({})", source.name)
            };
            parts.push(source.partial_clone(selection, name)?);
        }

        if !self.params.combine_clouds || parts.len() < 2 {
            return Ok(parts);
        }
        let mut parts = parts.into_iter();
        let mut fused = parts.next().unwrap_or_default();
        for part in parts {
            fused.append(&part)?;
        }
        Ok(vec![fused])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::buffer::GrowthPolicy;
    use crate::geometry::{keys, MetaValue};
    use crate::math::Point3;
    use crate::operations::contour::{ContourType, ContourVertices};
    use crate::operations::extract::NoProgress;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn line(y: f64) -> Polyline {
        Polyline::new(
            vec![Point3::new(0.0, y, 0.0), Point3::new(10.0, y, 0.0)],
            false,
        )
    }

    /// A 100 x 100 grid with 0.099 spacing from the origin, height = x.
    fn grid() -> PointCloud {
        let points = (0..10_000)
            .map(|i| {
                let x = f64::from(i % 100) * 0.099;
                let y = f64::from(i / 100) * 0.099;
                Point3::new(x, y, x)
            })
            .collect();
        PointCloud::new("grid", points)
    }

    fn params() -> ExtractionParams {
        ExtractionParams {
            thickness: 0.05,
            max_edge_length: 0.5,
            extract_clouds: true,
            extract_contours: true,
            ..ExtractionParams::default()
        }
    }

    #[test]
    fn extracts_contour_and_cloud() {
        init_tracing();
        let clouds = [grid()];
        let mut section = line(4.95);
        section
            .metadata
            .insert(keys::ABSCISSA, MetaValue::Scalar(42.0));

        let report = ExtractSections::new([&section], &clouds, params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);

        let output = &report.outputs[0];
        assert_eq!(output.clouds.len(), 1);
        assert_eq!(output.clouds[0].name, "Section cloud #1");
        // Row y = 4.95 lies exactly on the section line.
        assert_eq!(output.clouds[0].len(), 100);

        let contour = output.contour.as_ref().unwrap();
        assert_eq!(contour.polyline.name, "Section contour #1");
        assert_eq!(contour.polyline.metadata.scalar(keys::ABSCISSA), Some(42.0));
        for v in &contour.polyline.vertices {
            assert!((v.y - 4.95).abs() < 1e-12);
        }
    }

    fn scattered() -> [PointCloud; 1] {
        [PointCloud::new(
            "scattered",
            vec![
                Point3::new(1.0, 0.3, 1.0),
                Point3::new(5.0, -0.4, 2.0),
                Point3::new(9.0, 0.2, 1.0),
            ],
        )]
    }

    fn upper_params() -> ExtractionParams {
        ExtractionParams {
            thickness: 0.5,
            contour_type: ContourType::Upper,
            ..ExtractionParams::default()
        }
    }

    #[test]
    fn contour_vertices_are_source_points_by_default() {
        let clouds = scattered();
        let section = line(0.0);
        let report = ExtractSections::new([&section], &clouds, upper_params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        let contour = report.outputs[0].contour.as_ref().unwrap();
        assert_eq!(contour.polyline.vertices, clouds[0].points);
    }

    #[test]
    fn contour_vertices_on_section_plane_when_requested() {
        let clouds = scattered();
        let section = line(0.0);
        let params = ExtractionParams {
            contour_vertices: ContourVertices::SectionPlane,
            ..upper_params()
        };
        let report = ExtractSections::new([&section], &clouds, params)
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        let contour = report.outputs[0].contour.as_ref().unwrap();
        assert_eq!(
            contour.polyline.vertices,
            vec![
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(5.0, 0.0, 2.0),
                Point3::new(9.0, 0.0, 1.0),
            ]
        );
    }

    #[test]
    fn allocation_failure_is_isolated_to_its_slice() {
        init_tracing();
        // The first section covers the whole grid, the second only a corner.
        let wide = Polyline::new(
            vec![Point3::new(5.0, -1.0, 0.0), Point3::new(5.0, 11.0, 0.0)],
            false,
        );
        let corner = Polyline::new(
            vec![Point3::new(-1.0, 0.0, 0.0), Point3::new(0.15, 0.0, 0.0)],
            false,
        );
        let clouds = [grid()];
        let params = ExtractionParams {
            thickness: 20.0,
            growth: GrowthPolicy::default().with_capacity_limit(1_000),
            ..params()
        };
        let report = ExtractSections::new([&wide, &corner], &clouds, params)
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].section, 0);
        assert_eq!(report.failures[0].error.kind(), ErrorKind::AllocationFailure);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outputs[0].section, 1);
    }

    #[test]
    fn halt_on_error_stops_the_batch() {
        let clouds = [grid()];
        let params = ExtractionParams {
            growth: GrowthPolicy::default().with_capacity_limit(10),
            halt_on_error: true,
            ..params()
        };
        let (a, b) = (line(5.0), line(6.0));
        let report = ExtractSections::new([&a, &b], &clouds, params)
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 0);
    }

    #[test]
    fn separate_clouds_are_named_after_their_source() {
        let a = PointCloud::new("left", vec![Point3::new(1.0, 0.0, 0.0)]);
        let b = PointCloud::new("right", vec![Point3::new(9.0, 0.0, 0.0)]);
        let empty = PointCloud::new("far", vec![Point3::new(5.0, 50.0, 0.0)]);
        let clouds = [a, empty, b];
        let section = line(0.0);

        let combined = ExtractSections::new([&section], &clouds, params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        assert_eq!(combined.generated_clouds(), 1);
        assert_eq!(combined.outputs[0].clouds[0].len(), 2);

        let separate = ExtractSections::new(
            [&section],
            &clouds,
            ExtractionParams {
                combine_clouds: false,
                ..params()
            },
        )
        .execute(&mut NoProgress, &CancelToken::new())
        .unwrap();
        let names: Vec<&str> = separate.outputs[0]
            .clouds
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Section cloud #1 (left)", "Section cloud #1 (right)"]);
    }

    #[test]
    fn sparse_slice_yields_no_contour() {
        let clouds = [PointCloud::new("one", vec![Point3::new(5.0, 0.0, 0.0)])];
        let section = line(0.0);
        let report = ExtractSections::new([&section], &clouds, params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.generated_contours(), 0);
        assert_eq!(report.generated_clouds(), 1);
    }

    #[test]
    fn progress_and_skipped_sections() {
        let clouds = [grid()];
        let short = Polyline::new(vec![Point3::origin()], false);
        let (a, b) = (line(2.0), line(3.0));
        let mut seen = Vec::new();
        let mut sink = |p: SliceProgress| seen.push((p.processed, p.total));
        let report = ExtractSections::new([&a, &short, &b], &clouds, params())
            .execute(&mut sink, &CancelToken::new())
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.outputs[1].section, 2);
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn cancellation_between_slices() {
        let clouds = [grid()];
        let (a, b) = (line(2.0), line(3.0));
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let mut sink = move |_: SliceProgress| trigger.cancel();
        let report = ExtractSections::new([&a, &b], &clouds, params())
            .execute(&mut sink, &cancel)
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 0);
    }

    #[test]
    fn invalid_batches_are_rejected_up_front() {
        let clouds = [grid()];
        let short = Polyline::new(vec![Point3::origin()], false);

        let err = ExtractSections::new([&short], &clouds, params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let section = line(0.0);
        let err = ExtractSections::new([&section], &[], params())
            .execute(&mut NoProgress, &CancelToken::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyInput);

        let err = ExtractSections::new(
            [&section],
            &clouds,
            ExtractionParams {
                thickness: -1.0,
                ..params()
            },
        )
        .execute(&mut NoProgress, &CancelToken::new())
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
