//! Movement-throttled overlap scan over static geometry.
use glam::Vec3;

use crate::config::CoverConfig;
use crate::env::{GeometryQuery, OverlapBuffer};
use crate::geometry::Geometry;

/// Result of one [`GeometryScanner::scan`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    /// A fresh overlap query ran.
    Rescanned,
    /// The cached buffer was re-sorted for the new origin.
    Resorted,
    /// The cached buffer was returned untouched.
    Cached,
}

/// Finds static geometry around an origin, re-querying only after the origin
/// has moved far enough.
#[derive(Debug)]
pub struct GeometryScanner {
    buffer: OverlapBuffer,
    radius: f32,
    rescan_distance_sq: f32,
    resort_distance_sq: f32,
    last_scan: Option<Vec3>,
    last_sort: Option<Vec3>,
    generation: u64,
}

impl GeometryScanner {
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            buffer: OverlapBuffer::new(),
            radius: config.scan_radius,
            rescan_distance_sq: config.rescan_distance * config.rescan_distance,
            resort_distance_sq: config.resort_distance * config.resort_distance,
            last_scan: None,
            last_sort: None,
            generation: 0,
        }
    }

    /// Refreshes the buffer for `origin` and reports what work was done.
    pub fn scan(&mut self, world: &dyn GeometryQuery, origin: Vec3) -> ScanKind {
        let moved_sq = self
            .last_scan
            .map_or(f32::INFINITY, |last| last.distance_squared(origin));

        if moved_sq > self.rescan_distance_sq {
            self.buffer.clear();
            world.overlap(origin, self.radius, &mut self.buffer);
            self.sort_by_distance(origin);
            self.last_scan = Some(origin);
            self.generation += 1;
            tracing::debug!(?origin, found = self.buffer.len(), "geometry rescan");
            return ScanKind::Rescanned;
        }

        let sorted_sq = self
            .last_sort
            .map_or(f32::INFINITY, |last| last.distance_squared(origin));
        if sorted_sq > self.resort_distance_sq {
            self.sort_by_distance(origin);
            tracing::trace!(?origin, "geometry resort");
            return ScanKind::Resorted;
        }

        ScanKind::Cached
    }

    /// Geometry from the latest scan, nearest first.
    pub fn results(&self) -> &[Geometry] {
        &self.buffer
    }

    /// Incremented on every fresh overlap query.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forces the next [`scan`](Self::scan) to query again.
    pub fn invalidate(&mut self) {
        self.last_scan = None;
        self.last_sort = None;
    }

    fn sort_by_distance(&mut self, origin: Vec3) {
        self.buffer.sort_by(|a, b| {
            a.bounds
                .center
                .distance_squared(origin)
                .total_cmp(&b.bounds.center.distance_squared(origin))
        });
        self.last_sort = Some(origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGeometryWorld;

    fn world() -> FakeGeometryWorld {
        FakeGeometryWorld::default()
            .with_box(1, 10.0, 0.0, Vec3::ONE)
            .with_box(2, 3.0, 0.0, Vec3::ONE)
            .with_box(3, 60.0, 0.0, Vec3::ONE)
    }

    #[test]
    fn rescans_only_after_threshold() {
        let world = world();
        let mut scanner = GeometryScanner::new(&CoverConfig::default());

        assert_eq!(scanner.scan(&world, Vec3::ZERO), ScanKind::Rescanned);
        assert_eq!(scanner.results().len(), 2);
        assert_eq!(scanner.results()[0].id.0, 2);

        assert_eq!(scanner.scan(&world, Vec3::new(1.0, 0.0, 0.0)), ScanKind::Cached);
        assert_eq!(scanner.scan(&world, Vec3::new(2.0, 0.0, 0.0)), ScanKind::Resorted);
        assert_eq!(scanner.scan(&world, Vec3::new(3.5, 0.0, 0.0)), ScanKind::Rescanned);
        assert_eq!(world.queries(), 2);
        assert_eq!(scanner.generation(), 2);
    }

    #[test]
    fn empty_world_is_valid() {
        let world = FakeGeometryWorld::default();
        let mut scanner = GeometryScanner::new(&CoverConfig::default());
        scanner.scan(&world, Vec3::ZERO);
        assert!(scanner.results().is_empty());

        scanner.invalidate();
        assert_eq!(scanner.scan(&world, Vec3::ZERO), ScanKind::Rescanned);
    }
}
