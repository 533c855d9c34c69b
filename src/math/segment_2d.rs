use crate::math::{Point2, Vector2};

/// Projection of a point onto the span of a 2D segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanProjection {
    /// Longitudinal coordinate along the segment, in `[0, length]`.
    pub along: f64,
    /// Squared orthogonal distance from the point to the segment line.
    pub dist_sq: f64,
}

/// Projects `p` onto the segment starting at `a` with unit direction `u`
/// and length `length`.
///
/// Unlike a clamped point-to-segment distance, points whose projection falls
/// before `a` or past the segment end are rejected (`None`): a segment never
/// claims points beyond its own endpoints.
#[must_use]
pub fn project_on_span(p: &Point2, a: &Point2, u: &Vector2, length: f64) -> Option<SpanProjection> {
    let ap = p - a;
    let along = u.dot(&ap);
    if along < 0.0 || along > length {
        return None;
    }
    let dist_sq = (ap - u * along).norm_squared();
    Some(SpanProjection { along, dist_sq })
}
