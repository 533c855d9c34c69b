use std::collections::BTreeMap;

use crate::math::{Point3, Vector3, VerticalAxis};

/// Well-known keys describing the local frame of a profile section.
pub mod keys {
    /// Index of the vertical axis (integer).
    pub const UP_DIR: &str = "up_dir";
    /// Curvilinear abscissa of the section along its generatrix (scalar).
    pub const ABSCISSA: &str = "abscissa";
    /// Center of the section (vector).
    pub const CENTER: &str = "center";
    /// Direction of the section, orthogonal to the generatrix (vector).
    pub const DIRECTION: &str = "direction";
}

/// A metadata value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetaValue {
    Integer(i64),
    Scalar(f64),
    Vector(Vector3),
}

/// Open string-keyed mapping attached to polylines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: BTreeMap<String, MetaValue>,
}

impl Metadata {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) -> Option<MetaValue> {
        self.entries.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.get(key)
    }

    /// Returns the value under `key` as a scalar. Integers are widened.
    #[must_use]
    pub fn scalar(&self, key: &str) -> Option<f64> {
        match self.entries.get(key)? {
            MetaValue::Scalar(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            MetaValue::Integer(v) => Some(*v as f64),
            MetaValue::Vector(_) => None,
        }
    }

    #[must_use]
    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            MetaValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn vector(&self, key: &str) -> Option<Vector3> {
        match self.entries.get(key)? {
            MetaValue::Vector(v) => Some(*v),
            _ => None,
        }
    }

    /// Copies every entry of `other` into `self`, overwriting shared keys.
    pub fn extend_from(&mut self, other: &Metadata) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Local frame of an orthogonal section, as consumed by profile exporters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileFrame {
    pub up_axis: VerticalAxis,
    pub abscissa: f64,
    pub center: Point3,
    pub direction: Vector3,
}

impl ProfileFrame {
    /// Writes this frame into `metadata` under the [`keys`] names.
    pub fn write_to(&self, metadata: &mut Metadata) {
        #[allow(clippy::cast_possible_wrap)]
        let up = self.up_axis.index() as i64;
        metadata.insert(keys::UP_DIR, MetaValue::Integer(up));
        metadata.insert(keys::ABSCISSA, MetaValue::Scalar(self.abscissa));
        metadata.insert(keys::CENTER, MetaValue::Vector(self.center.coords));
        metadata.insert(keys::DIRECTION, MetaValue::Vector(self.direction));
    }

    /// Reads a frame back from `metadata`. Returns `None` if any key is missing.
    #[must_use]
    pub fn read_from(metadata: &Metadata) -> Option<Self> {
        let up = usize::try_from(metadata.integer(keys::UP_DIR)?).ok()?;
        Some(Self {
            up_axis: VerticalAxis::try_from(up).ok()?,
            abscissa: metadata.scalar(keys::ABSCISSA)?,
            center: Point3::from(metadata.vector(keys::CENTER)?),
            direction: metadata.vector(keys::DIRECTION)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let mut md = Metadata::new();
        md.insert("n", MetaValue::Integer(3));
        md.insert("s", MetaValue::Scalar(1.5));
        md.insert("v", MetaValue::Vector(Vector3::new(1.0, 2.0, 3.0)));

        assert_eq!(md.integer("n"), Some(3));
        assert_eq!(md.scalar("n"), Some(3.0));
        assert_eq!(md.scalar("s"), Some(1.5));
        assert_eq!(md.vector("v"), Some(Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(md.vector("s"), None);
        assert_eq!(md.integer("missing"), None);
    }

    #[test]
    fn extend_overwrites_shared_keys() {
        let mut a = Metadata::new();
        a.insert("k", MetaValue::Scalar(1.0));
        a.insert("only_a", MetaValue::Scalar(0.0));
        let mut b = Metadata::new();
        b.insert("k", MetaValue::Scalar(2.0));

        a.extend_from(&b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.scalar("k"), Some(2.0));
    }

    #[test]
    fn frame_survives_metadata() {
        let frame = ProfileFrame {
            up_axis: VerticalAxis::Y,
            abscissa: 12.5,
            center: Point3::new(1.0, 2.0, 3.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        let mut md = Metadata::new();
        frame.write_to(&mut md);
        assert_eq!(md.len(), 4);
        assert_eq!(ProfileFrame::read_from(&md), Some(frame));
    }

    #[test]
    fn incomplete_frame_is_none() {
        let mut md = Metadata::new();
        md.insert(keys::ABSCISSA, MetaValue::Scalar(1.0));
        assert!(ProfileFrame::read_from(&md).is_none());
    }
}
