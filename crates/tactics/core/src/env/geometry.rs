use arrayvec::ArrayVec;
use glam::Vec3;

use crate::geometry::Geometry;

/// Maximum number of geometry hits a single overlap query may report.
pub const MAX_OVERLAP_HITS: usize = 200;

/// Fixed-capacity buffer reused across overlap queries.
pub type OverlapBuffer = ArrayVec<Geometry, MAX_OVERLAP_HITS>;

/// Static-geometry overlap query provided by the host.
pub trait GeometryQuery: Send + Sync {
    /// Appends every static geometry item intersecting the sphere to `out`.
    ///
    /// Implementations must stop once the buffer is full instead of
    /// allocating; callers clear the buffer beforehand.
    fn overlap(&self, origin: Vec3, radius: f32, out: &mut OverlapBuffer);
}
