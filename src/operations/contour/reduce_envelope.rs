use crate::error::{InputError, Result};
use crate::math::{Point2, Point3};

/// Which side of an unrolled point scatter a contour follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourType {
    Upper,
    #[default]
    Lower,
    /// Upper envelope left to right, then lower envelope back, closed.
    Both,
}

/// A simplified envelope of an unrolled point set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedContour {
    /// Envelope vertices as `(abscissa, height)`.
    pub vertices: Vec<Point2>,
    /// For each vertex, the index of the input point it was taken from.
    pub source_indices: Vec<usize>,
    pub closed: bool,
}

/// Reduces unrolled points `(x = abscissa, y = height)` to an envelope polyline.
///
/// # Algorithm
///
/// 1. Sort points by `x` and keep, for each distinct `x`, the highest point
///    (upper) or the lowest point (lower). Envelope candidates therefore have
///    strictly increasing `x`.
/// 2. Build the half convex hull of the candidates (monotone chain).
/// 3. While a hull edge is longer than `max_edge_length` and candidates lie
///    strictly between its endpoints in `x`, split it at the candidate
///    closest to the edge on the inner side. Edges with no candidate in
///    their gap are kept as is.
///
/// A `max_edge_length` of zero disables step 3 and yields the half hull.
#[derive(Debug)]
pub struct ReduceEnvelope<'a> {
    points: &'a [Point3],
    max_edge_length: f64,
    contour_type: ContourType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Upper,
    Lower,
}

impl Side {
    /// `+1` when larger heights are more extreme on this side.
    fn sign(self) -> f64 {
        match self {
            Self::Upper => 1.0,
            Self::Lower => -1.0,
        }
    }
}

impl<'a> ReduceEnvelope<'a> {
    /// Creates a new envelope reduction.
    #[must_use]
    pub fn new(points: &'a [Point3], max_edge_length: f64, contour_type: ContourType) -> Self {
        Self {
            points,
            max_edge_length,
            contour_type,
        }
    }

    /// Executes the reduction. Returns `None` when fewer than 2 vertices remain.
    ///
    /// # Errors
    ///
    /// Returns `InputError::NonPositiveParameter` if `max_edge_length` is
    /// negative or not finite.
    pub fn execute(&self) -> Result<Option<ReducedContour>> {
        if self.max_edge_length < 0.0 || !self.max_edge_length.is_finite() {
            return Err(InputError::NonPositiveParameter {
                parameter: "max edge length",
                value: self.max_edge_length,
            }
            .into());
        }

        let (source_indices, closed) = match self.contour_type {
            ContourType::Upper => (self.envelope(Side::Upper), false),
            ContourType::Lower => (self.envelope(Side::Lower), false),
            ContourType::Both => {
                let mut ring = self.envelope(Side::Upper);
                let mut lower = self.envelope(Side::Lower);
                if lower.last() == ring.last() {
                    lower.pop();
                }
                lower.reverse();
                if lower.last() == ring.first() {
                    lower.pop();
                }
                ring.extend(lower);
                (ring, true)
            }
        };

        if source_indices.len() < 2 {
            return Ok(None);
        }
        let vertices = source_indices
            .iter()
            .map(|&i| Point2::new(self.points[i].x, self.points[i].y))
            .collect();
        Ok(Some(ReducedContour {
            vertices,
            source_indices,
            closed,
        }))
    }

    /// Input indices of the refined envelope on `side`, in increasing `x`.
    fn envelope(&self, side: Side) -> Vec<usize> {
        let candidates = self.candidates(side);
        if candidates.len() < 2 {
            return candidates;
        }
        let hull = self.half_hull(&candidates, side);
        self.refine(&candidates, &hull, side)
            .into_iter()
            .map(|k| candidates[k])
            .collect()
    }

    /// Input indices sorted by `x`, one per distinct `x`.
    fn candidates(&self, side: Side) -> Vec<usize> {
        let pts = self.points;
        let mut order: Vec<usize> = (0..pts.len())
            .filter(|&i| pts[i].x.is_finite() && pts[i].y.is_finite())
            .collect();
        order.sort_by(|&a, &b| {
            pts[a]
                .x
                .total_cmp(&pts[b].x)
                .then_with(|| pts[a].y.total_cmp(&pts[b].y))
        });

        let mut out: Vec<usize> = Vec::with_capacity(order.len());
        for i in order {
            match out.last_mut() {
                #[allow(clippy::float_cmp)]
                Some(last) if pts[*last].x == pts[i].x => {
                    // Sorted by y within a column: the last one is the highest.
                    if side == Side::Upper && pts[i].y > pts[*last].y {
                        *last = i;
                    }
                }
                _ => out.push(i),
            }
        }
        out
    }

    /// Monotone-chain half hull. Returns positions into `candidates`.
    fn half_hull(&self, candidates: &[usize], side: Side) -> Vec<usize> {
        let pts = self.points;
        let mut hull: Vec<usize> = Vec::with_capacity(candidates.len());
        for (k, &i) in candidates.iter().enumerate() {
            while hull.len() >= 2 {
                let o = &pts[candidates[hull[hull.len() - 2]]];
                let a = &pts[candidates[hull[hull.len() - 1]]];
                let b = &pts[i];
                let cross = (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);
                // Upper hull keeps right turns, lower hull keeps left turns.
                if cross * side.sign() >= 0.0 {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(k);
        }
        hull
    }

    /// Splits hull edges longer than the maximum edge length.
    fn refine(&self, candidates: &[usize], hull: &[usize], side: Side) -> Vec<usize> {
        if self.max_edge_length <= 0.0 {
            return hull.to_vec();
        }
        let pts = self.points;
        let max_sq = self.max_edge_length * self.max_edge_length;

        let mut out = Vec::with_capacity(hull.len());
        out.push(hull[0]);
        let mut stack = Vec::new();
        for w in hull.windows(2) {
            stack.push((w[0], w[1]));
            while let Some((lo, hi)) = stack.pop() {
                let a = &pts[candidates[lo]];
                let b = &pts[candidates[hi]];
                if hi <= lo + 1 || (b - a).xy().norm_squared() <= max_sq {
                    out.push(hi);
                    continue;
                }
                let slope = (b.y - a.y) / (b.x - a.x);
                let depth = |k: usize| {
                    let p = &pts[candidates[k]];
                    side.sign() * (p.y - (a.y + slope * (p.x - a.x)))
                };
                let split = (lo + 1..hi)
                    .max_by(|&k, &l| depth(k).total_cmp(&depth(l)))
                    .unwrap_or(lo + 1);
                stack.push((split, hi));
                stack.push((lo, split));
            }
        }
        out
    }
}
