use thiserror::Error;

/// Top-level error type for section extraction.
#[derive(Debug, Error)]
pub enum SectionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Slice(#[from] SliceError),
}

/// Errors raised while validating inputs, before any buffer is allocated.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("polyline has {count} vertices, at least 2 are required")]
    TooFewVertices { count: usize },

    #[error("no point cloud to extract from")]
    EmptyCloudSet,

    #[error("parameter {parameter} = {value} must be positive")]
    NonPositiveParameter { parameter: &'static str, value: f64 },

    #[error("axis index {0} is out of range [0, 2]")]
    InvalidAxis(usize),

    #[error("section not found")]
    UnknownSection,

    #[error("no section with at least 2 vertices")]
    NoValidSection,

    #[error("neither clouds nor contours were requested")]
    NoOutputRequested,
}

impl InputError {
    /// Returns `value` if it is a finite positive number.
    ///
    /// # Errors
    ///
    /// Returns `InputError::NonPositiveParameter` otherwise.
    pub fn check_positive(parameter: &'static str, value: f64) -> Result<f64, InputError> {
        if value > 0.0 && value.is_finite() {
            Ok(value)
        } else {
            Err(InputError::NonPositiveParameter { parameter, value })
        }
    }
}

/// Errors that abort a single slice. Other slices of a batch are unaffected.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("not enough memory to grow a slice buffer to {requested} entries")]
    AllocationFailure { requested: usize },

    #[error("internal consistency error: {0}")]
    InternalConsistency(String),

    #[error("extraction cancelled")]
    Cancelled,
}

/// Coarse classification of a [`SectionError`], one variant per reported outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    EmptyInput,
    AllocationFailure,
    InternalConsistency,
    Cancelled,
}

impl SectionError {
    /// Returns the outcome category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(InputError::EmptyCloudSet) => ErrorKind::EmptyInput,
            Self::Input(_) => ErrorKind::InvalidInput,
            Self::Slice(SliceError::AllocationFailure { .. }) => ErrorKind::AllocationFailure,
            Self::Slice(SliceError::InternalConsistency(_)) => ErrorKind::InternalConsistency,
            Self::Slice(SliceError::Cancelled) => ErrorKind::Cancelled,
        }
    }
}

/// Convenience type alias for results using [`SectionError`].
pub type Result<T, E = SectionError> = std::result::Result<T, E>;
