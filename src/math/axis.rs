use crate::error::InputError;
use crate::math::{Point2, Point3, Vector3};

/// The dimension treated as "up" while slicing.
///
/// The two remaining dimensions span the flattened plane. They are picked
/// cyclically: `x = (v + 1) % 3`, `y = (x + 1) % 3`, so that `(x, y, v)`
/// always forms a right-handed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAxis {
    X,
    Y,
    #[default]
    Z,
}

impl VerticalAxis {
    /// Index of the vertical dimension (0, 1 or 2).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Indices of the two flattened-plane dimensions.
    #[must_use]
    pub fn plane_dims(self) -> (usize, usize) {
        let v = self.index();
        let x = (v + 1) % 3;
        let y = (x + 1) % 3;
        (x, y)
    }

    /// Unit vector along the vertical dimension.
    #[must_use]
    pub fn unit(self) -> Vector3 {
        let mut n = Vector3::zeros();
        n[self.index()] = 1.0;
        n
    }

    /// Projects a 3D point onto the flattened plane.
    #[must_use]
    pub fn flatten(self, p: &Point3) -> Point2 {
        let (x, y) = self.plane_dims();
        Point2::new(p[x], p[y])
    }

    /// Returns `v` with its vertical component zeroed.
    #[must_use]
    pub fn flatten_vector(self, mut v: Vector3) -> Vector3 {
        v[self.index()] = 0.0;
        v
    }

    /// Vertical coordinate of a point.
    #[must_use]
    pub fn height(self, p: &Point3) -> f64 {
        p[self.index()]
    }

    /// Builds a 3D point from flattened-plane coordinates and a height.
    #[must_use]
    pub fn lift(self, plane: Point2, height: f64) -> Point3 {
        let (x, y) = self.plane_dims();
        let mut p = Point3::origin();
        p[x] = plane.x;
        p[y] = plane.y;
        p[self.index()] = height;
        p
    }
}

impl TryFrom<usize> for VerticalAxis {
    type Error = InputError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(Self::X),
            1 => Ok(Self::Y),
            2 => Ok(Self::Z),
            _ => Err(InputError::InvalidAxis(index)),
        }
    }
}
