//! Extraction assignment for agents and squads.
//!
//! The manager owns every piece of shared extraction state (resolver cache,
//! departure schedule, assignments, retry timers) and is only touched from the
//! scheduling thread.
use std::collections::HashMap;

use glam::Vec3;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use scheduler::{Step, TaskSlot};
use tactics_core::{
    AgentId, Audience, DepartureSchedule, ExfilKind, ExtractionConfig, ExtractionError,
    ExtractionResolver, SimTime, SpatialEnv, ZoneId,
};

use crate::api::{Result, RuntimeError};
use crate::tasks::{ExtractionScanTask, ExtractionTaskContext};
use crate::world::{AgentInfo, World};

/// Extraction point handed to an agent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExtractionAssignment {
    pub zone: ZoneId,
    pub position: Vec3,
    /// Committed departure for shared-timer zones.
    pub departs_at: Option<SimTime>,
}

#[derive(Debug)]
pub struct ExtractionManager {
    config: ExtractionConfig,
    resolver: ExtractionResolver,
    departures: DepartureSchedule,
    slot: TaskSlot<ExtractionScanTask>,
    assignments: HashMap<AgentId, ExtractionAssignment>,
    retry_at: HashMap<AgentId, SimTime>,
    rng: StdRng,
}

impl ExtractionManager {
    pub fn new(config: ExtractionConfig, rng: StdRng) -> Self {
        Self {
            resolver: ExtractionResolver::new(config.clone()),
            departures: DepartureSchedule::new(config.shared_timer_margin),
            slot: TaskSlot::new(ExtractionScanTask::new(config.scan_interval)),
            assignments: HashMap::new(),
            retry_at: HashMap::new(),
            config,
            rng,
        }
    }

    /// Steps the world-scope scan task once if it is awake.
    pub fn poll(&mut self, env: SpatialEnv<'_>, world: &World, now: SimTime) -> Option<Step> {
        let mut ctx = ExtractionTaskContext {
            env,
            now,
            zones: world.zones(),
            spawns: world.spawns(),
            resolver: &mut self.resolver,
            departures: &self.departures,
        };
        self.slot.poll(&mut ctx, now.seconds())
    }

    pub fn resolver(&self) -> &ExtractionResolver {
        &self.resolver
    }

    /// Re-runs the path check for `zone` against its current working position.
    pub fn validate(
        &mut self,
        env: SpatialEnv<'_>,
        zone: ZoneId,
    ) -> std::result::Result<bool, ExtractionError> {
        self.resolver.validate(env, zone)
    }

    pub fn scan_passes(&self) -> u64 {
        self.slot.task().passes()
    }

    pub fn assignment(&self, agent: AgentId) -> Option<&ExtractionAssignment> {
        self.assignments.get(&agent)
    }

    /// Seconds left before the committed departure of `zone`.
    pub fn departure_remaining(&self, zone: ZoneId, now: SimTime) -> Option<f32> {
        self.departures.remaining(zone, now)
    }

    /// Finds, or reuses, an extraction point for `agent`.
    ///
    /// Squad followers copy their leader's choice; a leader's new choice is
    /// broadcast to the whole squad.
    pub fn find(
        &mut self,
        env: SpatialEnv<'_>,
        world: &World,
        agent: AgentId,
        now: SimTime,
    ) -> Result<Option<ExtractionAssignment>> {
        let info = world.agent(agent).ok_or(RuntimeError::UnknownAgent(agent))?;
        if !info.faction.may_extract() {
            return Err(RuntimeError::ExtractionNotAllowed {
                agent,
                faction: info.faction,
            });
        }

        if let Some(squad) = world.squad_of(agent)
            && squad.leader != agent
        {
            let leader = squad.leader;
            let Some(lead) = self.find(env, world, leader, now)? else {
                return Ok(None);
            };
            if let Some(own) = self.assignments.get(&agent).filter(|a| a.zone == lead.zone) {
                return Ok(Some(*own));
            }
            let copied = self.follow(env, lead);
            self.assignments.insert(agent, copied);
            return Ok(Some(copied));
        }

        if let Some(current) = self.assignments.get(&agent).copied() {
            let still_usable = world
                .zones()
                .iter()
                .find(|z| z.id == current.zone)
                .is_some_and(|z| self.resolver.is_usable(z, &self.departures, now));
            if still_usable {
                return Ok(Some(current));
            }
            tracing::debug!(%agent, zone = %current.zone, "assigned zone no longer usable");
            self.assignments.remove(&agent);
        }

        if self.retry_at.get(&agent).is_some_and(|&at| now < at) {
            return Ok(None);
        }

        let Some(assignment) = self.choose(info, world, now) else {
            self.retry_at.insert(agent, now + self.config.retry_delay);
            tracing::debug!(%agent, retry_in = self.config.retry_delay, "no extraction available");
            return Ok(None);
        };
        self.retry_at.remove(&agent);
        self.assignments.insert(agent, assignment);
        tracing::info!(%agent, zone = %assignment.zone, position = ?assignment.position, "extraction assigned");

        if let Some(squad) = world.squad_of(agent) {
            for &member in squad.members.iter().filter(|&&m| m != agent) {
                let copied = self.follow(env, assignment);
                self.assignments.insert(member, copied);
            }
        }
        Ok(Some(assignment))
    }

    /// Forgets everything held for `agent`.
    pub fn forget(&mut self, agent: AgentId) {
        self.assignments.remove(&agent);
        self.retry_at.remove(&agent);
    }

    fn choose(&mut self, info: &AgentInfo, world: &World, now: SimTime) -> Option<ExtractionAssignment> {
        let audience = Audience::for_faction(info.faction);
        let min_distance = self.config.min_distance_to_extraction;

        let eligible: Vec<(ZoneId, Vec3)> = world
            .zones()
            .iter()
            .filter(|z| z.audience == audience && self.resolver.is_usable(z, &self.departures, now))
            .filter_map(|z| Some((z.id, self.resolver.validated_position(z.id)?)))
            .filter(|(_, position)| position.distance(info.position) >= min_distance)
            .collect();

        let &(zone_id, position) = eligible.choose(&mut self.rng)?;
        let zone = world.zones().iter().find(|z| z.id == zone_id)?;
        let departs_at = (zone.kind == ExfilKind::SharedTimer)
            .then(|| self.departures.commit(zone.id, now, zone.duration));

        Some(ExtractionAssignment {
            zone: zone_id,
            position,
            departs_at,
        })
    }

    /// Leader's assignment nudged sideways so followers do not stack up.
    fn follow(&mut self, env: SpatialEnv<'_>, lead: ExtractionAssignment) -> ExtractionAssignment {
        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * self.config.squad_offset_radius;
        let position = env
            .nav()
            .project(lead.position + offset, self.config.squad_snap_radius)
            .unwrap_or(lead.position);
        ExtractionAssignment { position, ..lead }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use tactics_core::testing::{FakeGeometryWorld, FakeNavMesh, FakeSight};
    use tactics_core::{Bounds, ExtractionZone, Faction, SpawnMarker, SquadId};

    use super::*;

    fn world() -> World {
        let mut world = World::default();
        world.zones = vec![
            ExtractionZone::new(ZoneId(1), "road", Bounds::new(Vec3::new(40.0, 1.0, 0.0), Vec3::splat(4.0)))
                .with_kind(ExfilKind::SharedTimer, 8.0),
        ];
        world.spawns = vec![SpawnMarker { position: Vec3::ZERO }];
        world
    }

    fn validate_all(manager: &mut ExtractionManager, env: SpatialEnv<'_>, world: &World) {
        while let Some(Step::Yield) = manager.poll(env, world, SimTime::ZERO) {}
    }

    #[test]
    fn shared_timer_is_identical_across_agents() {
        let nav = FakeNavMesh::flat();
        let (geo, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &geo, &sight);
        let mut world = world();
        world.insert_agent(AgentInfo::new(AgentId(1), Faction::Pmc, Vec3::ZERO));
        world.insert_agent(AgentInfo::new(AgentId(2), Faction::Pmc, Vec3::new(0.0, 0.0, 5.0)));

        let mut manager = ExtractionManager::new(ExtractionConfig::default(), StdRng::seed_from_u64(7));
        validate_all(&mut manager, env, &world);

        let first = manager.find(env, &world, AgentId(1), SimTime(1.0)).unwrap();
        let second = manager.find(env, &world, AgentId(2), SimTime(2.0)).unwrap();
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_eq!(first.departs_at, second.departs_at);
        assert!(first.departs_at.is_some_and(|t| (t.seconds() - 9.2).abs() < 1e-4));
    }

    #[test]
    fn non_extracting_factions_are_refused() {
        let nav = FakeNavMesh::flat();
        let (geo, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &geo, &sight);
        let mut world = world();
        world.insert_agent(AgentInfo::new(AgentId(3), Faction::Boss, Vec3::ZERO));
        let mut manager = ExtractionManager::new(ExtractionConfig::default(), StdRng::seed_from_u64(7));

        assert!(matches!(
            manager.find(env, &world, AgentId(3), SimTime::ZERO),
            Err(RuntimeError::ExtractionNotAllowed { .. })
        ));
    }

    #[test]
    fn unavailable_extraction_waits_for_retry_delay() {
        let nav = FakeNavMesh::flat();
        let (geo, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &geo, &sight);
        let mut world = world();
        world.insert_agent(AgentInfo::new(AgentId(1), Faction::Pmc, Vec3::new(39.0, 0.0, 0.0)));
        let mut manager = ExtractionManager::new(ExtractionConfig::default(), StdRng::seed_from_u64(7));
        validate_all(&mut manager, env, &world);

        assert_eq!(manager.find(env, &world, AgentId(1), SimTime(0.0)).unwrap(), None);
        world.agents.get_mut(&AgentId(1)).unwrap().position = Vec3::ZERO;
        assert_eq!(manager.find(env, &world, AgentId(1), SimTime(5.0)).unwrap(), None);
        assert!(manager.find(env, &world, AgentId(1), SimTime(10.0)).unwrap().is_some());
    }

    #[test]
    fn followers_get_offset_copies_of_leader_choice() {
        let nav = FakeNavMesh::flat();
        let (geo, sight) = (FakeGeometryWorld::default(), FakeSight::open());
        let env = SpatialEnv::new(&nav, &geo, &sight);
        let mut world = world();
        world.insert_agent(AgentInfo::new(AgentId(1), Faction::Pmc, Vec3::ZERO).in_squad(SquadId(1)));
        world.insert_agent(AgentInfo::new(AgentId(2), Faction::Pmc, Vec3::ZERO).in_squad(SquadId(1)));
        let mut manager = ExtractionManager::new(ExtractionConfig::default(), StdRng::seed_from_u64(3));
        validate_all(&mut manager, env, &world);

        let follower = manager.find(env, &world, AgentId(2), SimTime(1.0)).unwrap().unwrap();
        let leader = *manager.assignment(AgentId(1)).unwrap();
        assert_eq!(follower.zone, leader.zone);
        assert_eq!(follower.departs_at, leader.departs_at);
        assert!((follower.position.distance(leader.position) - 2.0).abs() < 1e-3);
    }
}
