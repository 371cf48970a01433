//! Per-zone incremental search for a reachable extraction position.
//!
//! Every call to [`ExtractionResolver::step_zone`] does at most one
//! projection pass (first call only), one spawn resolution (first call only)
//! and one path query. Results persist for the session.
use std::collections::{HashMap, HashSet};

use glam::Vec3;

use super::candidate::{ExtractionCandidate, SpawnAnchor, ZoneStep};
use super::departure::DepartureSchedule;
use super::error::ExtractionError;
use super::lattice::{build_lattice, search_radius};
use super::ordering::anti_cluster_stack;
use super::zone::{ExfilKind, ExtractionZone, SpawnMarker, ZoneId};
use crate::config::ExtractionConfig;
use crate::env::{NavMesh, SpatialEnv};
use crate::path::complete_path_exists;
use crate::types::SimTime;

#[derive(Debug)]
pub struct ExtractionResolver {
    config: ExtractionConfig,
    zones: HashMap<ZoneId, ExtractionCandidate>,
}

impl ExtractionResolver {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            zones: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Advances the search for `zone` by one test point.
    ///
    /// # Errors
    ///
    /// Propagates [`ExtractionError`] from [`Self::validate`]; the zone keeps
    /// its remaining test points for the next pass.
    pub fn step_zone(
        &mut self,
        env: SpatialEnv<'_>,
        zone: &ExtractionZone,
        spawns: &[SpawnMarker],
    ) -> Result<ZoneStep, ExtractionError> {
        let config = &self.config;
        let candidate = self
            .zones
            .entry(zone.id)
            .or_insert_with(|| prepare(env.nav(), zone, config));

        if let Some(position) = candidate.validated_position() {
            return Ok(ZoneStep::Validated(position));
        }

        if candidate.spawn == SpawnAnchor::Unresolved {
            candidate.spawn = resolve_spawn(env.nav(), zone, spawns, config);
        }
        if candidate.spawn == SpawnAnchor::Missing {
            return Ok(ZoneStep::NoSpawn);
        }

        let Some(point) = candidate.test_points.pop() else {
            return Ok(ZoneStep::Exhausted);
        };
        candidate.working = Some(point);

        if self.validate(env, zone.id)? {
            return Ok(ZoneStep::Validated(point));
        }
        if self.zones.get(&zone.id).is_some_and(|c| c.is_exhausted()) {
            tracing::debug!(zone = %zone.id, "extraction search exhausted");
            return Ok(ZoneStep::Exhausted);
        }
        Ok(ZoneStep::Pending)
    }

    /// Checks that a complete path joins the zone's spawn anchor and its
    /// working position. Success is permanent.
    pub fn validate(&mut self, env: SpatialEnv<'_>, zone: ZoneId) -> Result<bool, ExtractionError> {
        let candidate = self
            .zones
            .get_mut(&zone)
            .ok_or(ExtractionError::NotTracked(zone))?;
        if candidate.validated {
            return Ok(true);
        }
        let Some(working) = candidate.working else {
            let err = ExtractionError::PositionNotEstablished(zone);
            tracing::error!(%zone, error = %err, "validation requested before a position exists");
            return Err(err);
        };
        let SpawnAnchor::Resolved(start) = candidate.spawn else {
            return Ok(false);
        };

        if complete_path_exists(env.nav(), start, working) {
            candidate.validated = true;
            tracing::info!(%zone, position = ?working, "extraction position validated");
            return Ok(true);
        }
        Ok(false)
    }

    pub fn validated_position(&self, zone: ZoneId) -> Option<Vec3> {
        self.zones.get(&zone)?.validated_position()
    }

    pub fn candidate(&self, zone: ZoneId) -> Option<&ExtractionCandidate> {
        self.zones.get(&zone)
    }

    /// Drops search state for zones that are no longer present.
    pub fn retain_zones(&mut self, present: &[ExtractionZone]) {
        let ids: HashSet<ZoneId> = present.iter().map(|z| z.id).collect();
        self.zones.retain(|id, _| ids.contains(id));
    }

    /// True if bots may currently use `zone`.
    pub fn is_usable(&self, zone: &ExtractionZone, departures: &DepartureSchedule, now: SimTime) -> bool {
        if zone.is_blocked() {
            return false;
        }
        if zone.kind == ExfilKind::SharedTimer
            && departures
                .remaining(zone.id, now)
                .is_some_and(|left| left < self.config.min_departure_remaining)
        {
            return false;
        }
        true
    }
}

/// Builds the projected, deduplicated and ordered test points for a zone.
fn prepare(nav: &dyn NavMesh, zone: &ExtractionZone, config: &ExtractionConfig) -> ExtractionCandidate {
    let bounds = zone.bounds();
    let radius = search_radius(bounds, config);
    let lattice = build_lattice(bounds, radius, config);

    let mut seen = HashSet::new();
    let projected: Vec<Vec3> = lattice
        .into_iter()
        .filter_map(|p| nav.project(p, radius + config.projection_margin))
        .filter(|p| seen.insert(p.to_array().map(f32::to_bits)))
        .collect();

    tracing::debug!(zone = %zone.id, radius, points = projected.len(), "extraction test points prepared");
    ExtractionCandidate::new(zone.id, radius, anti_cluster_stack(projected, zone.position))
}

/// Nearest spawn marker to the zone's nominal position that projects onto
/// the navigation mesh.
fn resolve_spawn(
    nav: &dyn NavMesh,
    zone: &ExtractionZone,
    spawns: &[SpawnMarker],
    config: &ExtractionConfig,
) -> SpawnAnchor {
    let weighted = |marker: &SpawnMarker| {
        let d = marker.position - zone.position;
        (d.x * d.x + d.z * d.z + (config.vertical_weight * d.y).powi(2)).sqrt()
    };

    let mut ranked: Vec<(f32, &SpawnMarker)> = spawns
        .iter()
        .filter(|m| m.position.distance(zone.position) <= config.spawn_search_radius)
        .map(|m| (weighted(m), m))
        .collect();
    if ranked.is_empty() {
        ranked = spawns.iter().map(|m| (weighted(m), m)).collect();
    }
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let radius = config.default_search_radius + config.projection_margin;
    match ranked.iter().find_map(|(_, m)| nav.project(m.position, radius)) {
        Some(position) => {
            tracing::trace!(zone = %zone.id, ?position, "spawn anchor resolved");
            SpawnAnchor::Resolved(position)
        }
        None => {
            tracing::warn!(zone = %zone.id, markers = spawns.len(), "no usable spawn marker");
            SpawnAnchor::Missing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorSeverity, TacticalError};
    use crate::geometry::Bounds;
    use crate::testing::{FakeGeometryWorld, FakeNavMesh, FakeSight};

    fn zone() -> ExtractionZone {
        ExtractionZone::new(
            ZoneId(1),
            "gate",
            Bounds::new(Vec3::new(50.0, 1.0, 0.0), Vec3::new(10.0, 2.0, 6.0)),
        )
    }

    fn spawns() -> Vec<SpawnMarker> {
        vec![SpawnMarker {
            position: Vec3::new(0.0, 0.0, 0.0),
        }]
    }

    #[test]
    fn validates_first_reachable_point_and_stays_validated() {
        let nav = FakeNavMesh::flat();
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());

        let Ok(ZoneStep::Validated(position)) = resolver.step_zone(env, &zone(), &spawns()) else {
            panic!("expected validation");
        };
        assert_eq!(position.y, 0.0);
        let queries = nav.path_queries();
        assert_eq!(queries, 1);

        assert_eq!(resolver.step_zone(env, &zone(), &spawns()).unwrap(), ZoneStep::Validated(position));
        assert_eq!(nav.path_queries(), queries);
        assert_eq!(resolver.validated_position(ZoneId(1)), Some(position));
    }

    #[test]
    fn unreachable_points_are_consumed_one_per_step() {
        let nav = FakeNavMesh::flat()
            .with_wall(Vec3::new(40.0, 0.0, -100.0), Vec3::new(40.0, 0.0, 100.0));
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());

        assert_eq!(resolver.step_zone(env, &zone(), &spawns()).unwrap(), ZoneStep::Pending);
        let left = resolver.candidate(ZoneId(1)).map(|c| c.test_points.len()).unwrap_or_default();
        assert!(left > 0);

        let mut last = ZoneStep::Pending;
        for _ in 0..left {
            last = resolver.step_zone(env, &zone(), &spawns()).unwrap();
        }
        assert_eq!(last, ZoneStep::Exhausted);
        assert_eq!(resolver.validated_position(ZoneId(1)), None);
    }

    #[test]
    fn missing_spawn_blocks_validation() {
        let nav = FakeNavMesh::flat()
            .with_unwalkable(Bounds::new(Vec3::ZERO, Vec3::new(20.0, 1.0, 20.0)));
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());

        assert_eq!(resolver.step_zone(env, &zone(), &spawns()).unwrap(), ZoneStep::NoSpawn);
        assert_eq!(nav.path_queries(), 0);
    }

    #[test]
    fn spawn_ranking_is_measured_from_zone_position() {
        let nav = FakeNavMesh::flat();
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let config = ExtractionConfig {
            spawn_search_radius: 9.0,
            ..ExtractionConfig::default()
        };
        let mut resolver = ExtractionResolver::new(config);
        // Closer in a straight line, but the climb outweighs it.
        let raised = SpawnMarker {
            position: Vec3::new(50.0, 3.0, 6.0),
        };
        let level = SpawnMarker {
            position: Vec3::new(58.0, 1.0, 0.0),
        };
        let outside = SpawnMarker {
            position: Vec3::new(0.0, 1.0, 0.0),
        };

        resolver.step_zone(env, &zone(), &[outside, raised, level]).unwrap();
        assert_eq!(
            resolver.candidate(ZoneId(1)).map(|c| c.spawn),
            Some(SpawnAnchor::Resolved(Vec3::new(58.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn validate_without_working_position_is_internal_error() {
        let nav = FakeNavMesh::flat();
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());

        assert_eq!(resolver.validate(env, ZoneId(1)), Err(ExtractionError::NotTracked(ZoneId(1))));

        resolver.zones.insert(ZoneId(1), ExtractionCandidate::new(ZoneId(1), 1.0, Vec::new()));
        let err = resolver.validate(env, ZoneId(1)).unwrap_err();
        assert_eq!(err, ExtractionError::PositionNotEstablished(ZoneId(1)));
        assert_eq!(err.severity(), ErrorSeverity::Internal);
    }

    #[test]
    fn usability_respects_departure_margin() {
        let resolver = ExtractionResolver::new(ExtractionConfig::default());
        let shared = zone().with_kind(ExfilKind::SharedTimer, 5.0);
        let mut departures = DepartureSchedule::new(0.2);

        assert!(resolver.is_usable(&shared, &departures, SimTime(0.0)));
        departures.commit(shared.id, SimTime(0.0), shared.duration);
        assert!(resolver.is_usable(&shared, &departures, SimTime(4.0)));
        assert!(!resolver.is_usable(&shared, &departures, SimTime(4.5)));
    }

    #[test]
    fn retain_drops_vanished_zones() {
        let nav = FakeNavMesh::flat();
        let (world, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &world, &sight);
        let mut resolver = ExtractionResolver::new(ExtractionConfig::default());
        resolver.step_zone(env, &zone(), &spawns()).unwrap();

        resolver.retain_zones(&[]);
        assert!(resolver.candidate(ZoneId(1)).is_none());
    }
}
