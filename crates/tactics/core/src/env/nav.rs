use glam::Vec3;

/// Navigation mesh query service provided by the host.
pub trait NavMesh: Send + Sync {
    /// Snaps `point` to the closest walkable position within `radius`.
    fn project(&self, point: Vec3, radius: f32) -> Option<Vec3>;

    /// Returns true only if a complete (non-partial) path connects the points.
    fn path_exists(&self, start: Vec3, end: Vec3) -> bool;

    /// Length of the complete path between the points, if one exists.
    ///
    /// The default falls back to the straight-line distance whenever a
    /// complete path exists. Hosts with corner data should override it.
    fn path_length(&self, start: Vec3, end: Vec3) -> Option<f32> {
        self.path_exists(start, end).then(|| start.distance(end))
    }
}
