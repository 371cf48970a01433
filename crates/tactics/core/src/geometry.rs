//! Geometric primitives shared by the cover and extraction searches.
use std::fmt;

use glam::Vec3;

/// Identifier of a static geometry item (a collider in the host engine).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeometryId(pub u32);

impl fmt::Display for GeometryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "geo#{}", self.0)
    }
}

/// Axis-aligned box described by its centre and full size.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub center: Vec3,
    pub size: Vec3,
}

impl Bounds {
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            size: (max - min).abs(),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.size * 0.5
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Smallest of the three side lengths.
    pub fn min_extent(&self) -> f32 {
        self.size.min_element()
    }

    /// True when every side length is zero, i.e. the host handed us a point.
    pub fn is_degenerate(&self) -> bool {
        self.size == Vec3::ZERO
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        point.cmpge(min).all() && point.cmple(max).all()
    }
}

/// A static geometry item returned by an overlap query.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geometry {
    pub id: GeometryId,
    pub bounds: Bounds,
}

impl Geometry {
    pub const fn new(id: GeometryId, bounds: Bounds) -> Self {
        Self { id, bounds }
    }
}

/// Projects a vector onto the horizontal plane.
#[inline]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Shortest distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: Vec3, a: Vec3, b: Vec3) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_min_max_round_trip() {
        let bounds = Bounds::from_min_max(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(1.0, 2.0, 2.0));
        assert_eq!(bounds.center, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bounds.size, Vec3::new(2.0, 2.0, 4.0));
        assert_eq!(bounds.min_extent(), 2.0);
        assert!(bounds.contains(Vec3::new(0.5, 1.5, -1.5)));
        assert!(!bounds.contains(Vec3::new(0.5, 2.5, -1.5)));
    }

    #[test]
    fn zero_size_bounds_are_degenerate() {
        assert!(Bounds::new(Vec3::ONE, Vec3::ZERO).is_degenerate());
        assert!(!Bounds::new(Vec3::ONE, Vec3::new(2.0, 0.0, 4.0)).is_degenerate());
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(distance_to_segment(Vec3::new(5.0, 0.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Vec3::new(-4.0, 0.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Vec3::new(1.0, 0.0, 0.0), a, a), 1.0);
    }
}
