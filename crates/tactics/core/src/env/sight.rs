use glam::Vec3;

/// Line-of-sight raycaster provided by the host.
pub trait SightOracle: Send + Sync {
    /// Returns true if nothing blocks the segment from `from` to `to`.
    fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool;
}
