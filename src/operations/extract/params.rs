use crate::buffer::GrowthPolicy;
use crate::error::InputError;
use crate::geometry::PointCloud;
use crate::math::VerticalAxis;
use crate::operations::contour::{ContourType, ContourVertices};

/// Ratio between the clouds' largest extent and the derived default
/// thickness and max edge length.
const DEFAULT_SIZE_RATIO: f64 = 500.0;

/// Parameters of a section extraction batch.
///
/// `thickness` is the half-width of the band around each section.
/// `max_edge_length = 0` yields unrefined envelopes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionParams {
    pub axis: VerticalAxis,
    pub thickness: f64,
    pub max_edge_length: f64,
    pub contour_type: ContourType,
    pub extract_clouds: bool,
    pub extract_contours: bool,
    /// Fuse the selections of all input clouds into one cloud per section.
    pub combine_clouds: bool,
    pub contour_vertices: ContourVertices,
    pub growth: GrowthPolicy,
    /// Stop the batch at the first failed slice.
    pub halt_on_error: bool,
}

impl Default for ExtractionParams {
    fn default() -> Self {
        Self {
            axis: VerticalAxis::Z,
            thickness: 0.0,
            max_edge_length: 0.0,
            contour_type: ContourType::Lower,
            extract_clouds: false,
            extract_contours: true,
            combine_clouds: true,
            contour_vertices: ContourVertices::SourcePoint,
            growth: GrowthPolicy::default(),
            halt_on_error: false,
        }
    }
}

impl ExtractionParams {
    /// Fills an unset (non-positive) thickness and max edge length with
    /// `max extent / 500` of the clouds' joint bounding box.
    #[must_use]
    pub fn with_defaults_for(mut self, clouds: &[PointCloud]) -> Self {
        let Some(bb) = clouds
            .iter()
            .filter_map(PointCloud::bounding_box)
            .reduce(|a, b| a.union(&b))
        else {
            return self;
        };
        let default = bb.max_dim() / DEFAULT_SIZE_RATIO;
        if self.thickness <= 0.0 {
            self.thickness = default;
        }
        if self.max_edge_length <= 0.0 {
            self.max_edge_length = default;
        }
        self
    }

    /// Checks the parameters before any buffer is allocated.
    ///
    /// # Errors
    ///
    /// - `InputError::NonPositiveParameter` if the thickness is not positive or
    ///   the max edge length is negative
    /// - `InputError::NoOutputRequested` if neither clouds nor contours are requested
    pub fn validate(&self) -> Result<(), InputError> {
        InputError::check_positive("thickness", self.thickness)?;
        if self.max_edge_length < 0.0 || !self.max_edge_length.is_finite() {
            return Err(InputError::NonPositiveParameter {
                parameter: "max edge length",
                value: self.max_edge_length,
            });
        }
        if !self.extract_clouds && !self.extract_contours {
            return Err(InputError::NoOutputRequested);
        }
        Ok(())
    }
}
