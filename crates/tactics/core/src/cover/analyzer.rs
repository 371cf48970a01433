//! Turns raw geometry into scored cover candidates.
//!
//! Each call does a bounded amount of work: one projection, at most a handful
//! of line-of-sight probes and one path query. Any failed step rejects the
//! geometry with `None`; rejection is a normal outcome, never an error.
use glam::Vec3;

use super::candidate::{CandidateId, CoverCandidate, CoverStatus};
use crate::config::CoverConfig;
use crate::env::{OverlapBuffer, SpatialEnv};
use crate::geometry::{Geometry, distance_to_segment, flatten};
use crate::path::complete_path_length;

const SCORE_POSE_WEIGHT: f32 = 10.0;
const SCORE_DISTANCE_CAP: f32 = 50.0;
const SCORE_DISTANCE_DIVISOR: f32 = 5.0;
const SCORE_HEIGHT_CAP: f32 = 3.0;
const SCORE_PATH_DIVISOR: f32 = 10.0;
const PRESENCE_PROBE_RADIUS: f32 = 0.1;

/// Where the search runs from and what it hides from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchFrame {
    /// Agent position the paths are measured from.
    pub origin: Vec3,
    /// Ground position of the threat.
    pub threat: Vec3,
}

/// Scores geometry against a threat.
#[derive(Clone, Debug)]
pub struct CandidateAnalyzer {
    config: CoverConfig,
}

impl CandidateAnalyzer {
    pub fn new(config: CoverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CoverConfig {
        &self.config
    }

    /// Analyses one geometry item. The returned candidate carries a
    /// placeholder id; the pool assigns the real one on admission.
    pub fn analyze(
        &self,
        env: SpatialEnv<'_>,
        geometry: &Geometry,
        frame: SearchFrame,
    ) -> Option<CoverCandidate> {
        let radius = self.probe_radius(geometry);
        let bounds = geometry.bounds;

        let mut away = flatten(bounds.center - frame.threat).normalize_or_zero();
        if away == Vec3::ZERO {
            away = Vec3::X;
        }
        let mut raw = bounds.center + away * (radius + self.config.agent_clearance);
        raw.y = bounds.min().y;

        let Some(position) = env.nav().project(raw, radius) else {
            tracing::trace!(geometry = %geometry.id, "rejected: no navmesh projection");
            return None;
        };

        let threat_distance = position.distance(frame.threat);
        if threat_distance < self.config.min_threat_distance {
            tracing::trace!(geometry = %geometry.id, threat_distance, "rejected: too close to threat");
            return None;
        }

        let Some(pose_height) = self.blocking_pose(env, position, frame.threat) else {
            tracing::trace!(geometry = %geometry.id, "rejected: exposed at every pose");
            return None;
        };

        let Some(path_length) = complete_path_length(env.nav(), frame.origin, position) else {
            tracing::trace!(geometry = %geometry.id, "rejected: unreachable");
            return None;
        };

        let mut candidate = CoverCandidate {
            id: CandidateId(0),
            geometry: geometry.id,
            bounds,
            position,
            path_length,
            straight_status: CoverStatus::None,
            path_status: CoverStatus::None,
            cover_value: 0.0,
            pose_height,
            is_safe_path: false,
            spotted_until: None,
            is_bad: false,
            occupant: None,
        };
        self.refresh_score(&mut candidate, frame);
        candidate.update_status(frame.origin, Some(path_length), &self.config);

        tracing::trace!(
            geometry = %geometry.id,
            score = candidate.cover_value,
            pose_height,
            path_length,
            "candidate accepted"
        );
        Some(candidate)
    }

    /// Re-runs the presence, pose and path checks for an existing candidate.
    ///
    /// Returns false when the geometry is gone, the candidate no longer blocks
    /// the threat, or it became unreachable from `origin`. Path length and
    /// distance categories are always refreshed; pose and score only when a
    /// threat is known.
    pub fn recheck(
        &self,
        env: SpatialEnv<'_>,
        candidate: &mut CoverCandidate,
        origin: Vec3,
        threat: Option<Vec3>,
    ) -> bool {
        let mut hits = OverlapBuffer::new();
        env.geometry()
            .overlap(candidate.bounds.center, PRESENCE_PROBE_RADIUS, &mut hits);
        if !hits.iter().any(|g| g.id == candidate.geometry) {
            tracing::trace!(candidate = %candidate.id, "recheck failed: geometry gone");
            return false;
        }

        let pose_height = match threat {
            Some(threat) => match self.blocking_pose(env, candidate.position, threat) {
                Some(height) => Some(height),
                None => {
                    tracing::trace!(candidate = %candidate.id, "recheck failed: exposed");
                    return false;
                }
            },
            None => None,
        };
        let Some(path_length) = complete_path_length(env.nav(), origin, candidate.position) else {
            tracing::trace!(candidate = %candidate.id, "recheck failed: unreachable");
            return false;
        };

        candidate.path_length = path_length;
        if let (Some(threat), Some(pose_height)) = (threat, pose_height) {
            candidate.pose_height = pose_height;
            self.refresh_score(candidate, SearchFrame { origin, threat });
        }
        candidate.update_status(origin, Some(path_length), &self.config);
        true
    }

    /// Half the larger horizontal extent, or the configured default when the
    /// geometry has none.
    fn probe_radius(&self, geometry: &Geometry) -> f32 {
        let size = geometry.bounds.size;
        let radius = size.x.max(size.z) * 0.5;
        if radius > 0.0 {
            return radius;
        }
        tracing::warn!(
            geometry = %geometry.id,
            size = ?size,
            fallback = self.config.default_probe_radius,
            "geometry has no horizontal extent, using default probe radius"
        );
        self.config.default_probe_radius
    }

    /// Highest eye height, stepping down from standing, at which the threat
    /// cannot see the candidate.
    fn blocking_pose(&self, env: SpatialEnv<'_>, position: Vec3, threat: Vec3) -> Option<f32> {
        let threat_eye = threat + Vec3::Y * self.config.standing_height;
        let span = self.config.standing_height - self.config.min_pose_height;
        let steps = (span / self.config.probe_step + 1e-3).floor() as u32;

        (0..=steps)
            .map(|i| self.config.standing_height - i as f32 * self.config.probe_step)
            .find(|&height| {
                let eye = position + Vec3::Y * height;
                !env.sight().line_of_sight(eye, threat_eye)
            })
    }

    fn refresh_score(&self, candidate: &mut CoverCandidate, frame: SearchFrame) {
        let threat_distance = candidate.position.distance(frame.threat);
        let pose_ratio = candidate.pose_height / self.config.standing_height;

        candidate.cover_value = pose_ratio * SCORE_POSE_WEIGHT
            + threat_distance.min(SCORE_DISTANCE_CAP) / SCORE_DISTANCE_DIVISOR
            + candidate.bounds.height().min(SCORE_HEIGHT_CAP)
            - candidate.path_length / SCORE_PATH_DIVISOR;
        candidate.is_safe_path = distance_to_segment(frame.threat, frame.origin, candidate.position)
            >= self.config.safe_path_threat_distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, GeometryId};
    use crate::testing::{
        FakeGeometryWorld, FakeNavMesh, FakeSight, capture_logs, ground_box, init_tracing,
    };

    fn frame() -> SearchFrame {
        SearchFrame {
            origin: Vec3::ZERO,
            threat: Vec3::new(-20.0, 0.0, 0.0),
        }
    }

    #[test]
    fn tall_box_gives_standing_cover_on_far_side() {
        let items = vec![ground_box(1, 3.0, 0.0, Vec3::new(1.0, 2.0, 1.0))];
        let world = FakeGeometryWorld::new(items.clone());
        let sight = FakeSight::from_geometry(&items);
        let nav = FakeNavMesh::flat();
        let env = SpatialEnv::new(&nav, &world, &sight);
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());

        let candidate = analyzer.analyze(env, &items[0], frame()).expect("accepted");
        assert!(candidate.position.distance(Vec3::new(4.1, 0.0, 0.0)) < 1e-4);
        assert_eq!(candidate.pose_height, 1.6);
        assert!(candidate.is_safe_path);
        assert_eq!(candidate.straight_status, CoverStatus::CloseToCover);
        let expected = 10.0 + 24.1 / 5.0 + 2.0 - 4.1 / 10.0;
        assert!((candidate.cover_value - expected).abs() < 1e-4);
    }

    #[test]
    fn low_box_requires_crouch() {
        let items = vec![ground_box(1, 3.0, 0.0, Vec3::new(1.0, 1.0, 1.0))];
        let world = FakeGeometryWorld::new(items.clone());
        let sight = FakeSight::from_geometry(&items);
        let nav = FakeNavMesh::flat();
        let env = SpatialEnv::new(&nav, &world, &sight);
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());

        let candidate = analyzer.analyze(env, &items[0], frame()).expect("accepted");
        assert!(candidate.pose_height < 1.0);
        assert!(candidate.pose_height >= 0.5);
    }

    #[test]
    fn degenerate_geometry_falls_back_and_is_exposed() {
        init_tracing();
        let point = Geometry::new(GeometryId(9), Bounds::new(Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO));
        let world = FakeGeometryWorld::new(vec![point]);
        let sight = FakeSight::from_geometry(&[point]);
        let nav = FakeNavMesh::flat();
        let env = SpatialEnv::new(&nav, &world, &sight);
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());

        assert_eq!(analyzer.probe_radius(&point), CoverConfig::DEFAULT_PROBE_RADIUS);
        assert!(analyzer.analyze(env, &point, frame()).is_none());
    }

    #[test]
    fn recheck_without_threat_still_tracks_distance() {
        let items = vec![ground_box(1, 3.0, 0.0, Vec3::new(1.0, 2.0, 1.0))];
        let world = FakeGeometryWorld::new(items.clone());
        let sight = FakeSight::from_geometry(&items);
        let nav = FakeNavMesh::flat();
        let env = SpatialEnv::new(&nav, &world, &sight);
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());
        let mut candidate = analyzer.analyze(env, &items[0], frame()).expect("accepted");
        let (score, pose) = (candidate.cover_value, candidate.pose_height);

        let arrived = candidate.position + Vec3::new(0.3, 0.0, 0.0);
        assert!(analyzer.recheck(env, &mut candidate, arrived, None));
        assert!((candidate.path_length - 0.3).abs() < 1e-4);
        assert_eq!(candidate.straight_status, CoverStatus::InCover);
        assert_eq!(candidate.path_status, CoverStatus::InCover);
        assert_eq!((candidate.cover_value, candidate.pose_height), (score, pose));
    }

    #[test]
    fn pole_without_horizontal_extent_warns_and_uses_default_radius() {
        let pole = Geometry::new(
            GeometryId(4),
            Bounds::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.0, 2.0, 0.0)),
        );
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());

        let (radius, logs) = capture_logs(|| analyzer.probe_radius(&pole));
        assert_eq!(radius, CoverConfig::DEFAULT_PROBE_RADIUS);
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("using default probe radius"), "{logs}");

        let wide = ground_box(5, 3.0, 0.0, Vec3::new(2.0, 1.0, 1.0));
        let (radius, logs) = capture_logs(|| analyzer.probe_radius(&wide));
        assert_eq!(radius, 1.0);
        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn rejects_near_threat_and_unreachable() {
        let near = ground_box(1, -15.0, 0.0, Vec3::new(1.0, 2.0, 1.0));
        let walled = ground_box(2, 3.0, 0.0, Vec3::new(1.0, 2.0, 1.0));
        let items = vec![near, walled];
        let world = FakeGeometryWorld::new(items.clone());
        let sight = FakeSight::from_geometry(&items);
        let nav = FakeNavMesh::flat()
            .with_wall(Vec3::new(2.0, 0.0, -5.0), Vec3::new(2.0, 0.0, 5.0));
        let env = SpatialEnv::new(&nav, &world, &sight);
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());

        assert!(analyzer.analyze(env, &near, frame()).is_none());
        assert!(analyzer.analyze(env, &walled, frame()).is_none());
    }

    #[test]
    fn recheck_fails_once_geometry_disappears() {
        let items = vec![ground_box(1, 3.0, 0.0, Vec3::new(1.0, 2.0, 1.0))];
        let world = FakeGeometryWorld::new(items.clone());
        let sight = FakeSight::from_geometry(&items);
        let nav = FakeNavMesh::flat();
        let analyzer = CandidateAnalyzer::new(CoverConfig::default());
        let mut candidate = analyzer
            .analyze(SpatialEnv::new(&nav, &world, &sight), &items[0], frame())
            .expect("accepted");

        let moved = SearchFrame {
            origin: Vec3::new(1.0, 0.0, 0.0),
            ..frame()
        };
        let env = SpatialEnv::new(&nav, &world, &sight);
        assert!(analyzer.recheck(env, &mut candidate, moved.origin, Some(moved.threat)));
        assert!((candidate.path_length - 3.1).abs() < 1e-4);

        let empty = FakeGeometryWorld::default();
        let env = SpatialEnv::new(&nav, &empty, &sight);
        assert!(!analyzer.recheck(env, &mut candidate, moved.origin, Some(moved.threat)));
    }
}
