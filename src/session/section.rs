use crate::geometry::Polyline;

slotmap::new_key_type! {
    /// Unique identifier for a section in a [`SectionPool`](super::SectionPool).
    pub struct SectionId;
}

/// Whether a section only lives in the pool or has been handed over to the
/// host's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    Provisional,
    Persisted,
}

/// A section polyline and its lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub polyline: Polyline,
    pub state: SectionState,
}

impl Section {
    #[must_use]
    pub fn new(polyline: Polyline, state: SectionState) -> Self {
        Self { polyline, state }
    }

    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.state == SectionState::Persisted
    }
}
