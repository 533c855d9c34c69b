use tracing::debug;

use crate::error::{InputError, Result};
use crate::geometry::{Polyline, ProfileFrame};
use crate::math::VerticalAxis;
use crate::operations::sample::{DegenerateSegments, SamplePolyline};

/// Width and spacing of generated orthogonal sections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthoSectionParams {
    width: f64,
    step: f64,
}

impl OrthoSectionParams {
    /// Creates section parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if `width` or `step` is not positive.
    pub fn new(width: f64, step: f64) -> Result<Self, InputError> {
        Ok(Self {
            width: InputError::check_positive("section width", width)?,
            step: InputError::check_positive("section step", step)?,
        })
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Generates sections orthogonal to a path, every `step` units of
/// curvilinear abscissa starting at 0.
///
/// Each section is a 2-vertex open polyline of length `width` centered on the
/// path, `center + n * width / 2` then `center - n * width / 2`, where `n` is
/// the unit normal of the path segment within the flattened plane. The center
/// is interpolated horizontally along the segment and keeps the height of the
/// segment start. Sections carry their [`ProfileFrame`] as metadata and are
/// named `<path name>.<k>` with `k` counted from 1.
///
/// Abscissas are measured along the full 3D path, vertical segments
/// included. An emission position equal to the path length is not emitted.
/// Positions falling on segments that are vertical (degenerate once
/// flattened) are skipped.
#[derive(Debug)]
pub struct GenerateOrthoSections<'a> {
    path: &'a Polyline,
    axis: VerticalAxis,
    params: OrthoSectionParams,
}

impl<'a> GenerateOrthoSections<'a> {
    /// Creates a new generation along `path`.
    #[must_use]
    pub fn new(path: &'a Polyline, axis: VerticalAxis, params: OrthoSectionParams) -> Self {
        Self { path, axis, params }
    }

    /// Executes the generation.
    ///
    /// # Errors
    ///
    /// Returns `InputError::TooFewVertices` if the path has fewer than 2 vertices.
    pub fn execute(&self) -> Result<Vec<Polyline>> {
        let sampling = SamplePolyline::new(self.path, self.axis)
            .with_degenerate(DegenerateSegments::Advance)
            .execute()?;
        let half_width = self.params.width * 0.5;
        let step = self.params.step;

        let mut sections = Vec::new();
        let mut k: u64 = 0;
        let mut skipped = 0_u64;
        #[allow(clippy::cast_precision_loss)]
        let next = |k: u64| k as f64 * step;

        for seg in &sampling.segments {
            let l = seg.abscissa;
            if next(k) < l {
                // Positions below floor(l / step) all fall before this segment.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let jump = (l / step).floor() as u64;
                if jump > k {
                    skipped += jump - k;
                    k = jump;
                }
                while next(k) < l {
                    skipped += 1;
                    k += 1;
                }
            }

            let ab = seg.flat_vector(self.axis);
            while next(k) < l + seg.length {
                let s = next(k);
                let center = seg.start + ab * ((s - l) / seg.length);
                let offset = seg.normal * half_width;

                let mut section = Polyline::new(vec![center + offset, center - offset], false)
                    .with_name(format!("{}.{}", self.path.name, sections.len() + 1));
                ProfileFrame {
                    up_axis: self.axis,
                    abscissa: s,
                    center,
                    direction: seg.normal,
                }
                .write_to(&mut section.metadata);
                sections.push(section);
                k += 1;
            }
        }

        if skipped > 0 {
            debug!(skipped, "sections on vertical segments skipped");
        }
        debug!(
            path = %self.path.name,
            count = sections.len(),
            length = sampling.total_length,
            "generated orthogonal sections"
        );
        Ok(sections)
    }
}
