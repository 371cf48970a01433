//! High-level tactical runtime.
//!
//! The runtime owns every per-agent cover finder, the world-scope extraction
//! scan and the registry they read from. The host drives it by calling
//! [`TacticalRuntime::tick`] once per simulation frame with its spatial
//! services, and queries results through the methods below.
use std::collections::HashMap;

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use scheduler::Step;
use tactics_core::{
    AgentId, CandidateId, CombatDecision, CoverCandidate, CoverEvent, CoverState, DirectionQuery,
    ExtractionZone,
    SearchConfig, SimTime, SpatialEnv, SpawnMarker, SubscriptionId, ZoneId,
};

use crate::agent::AgentCover;
use crate::api::{Result, RuntimeError};
use crate::extraction::{ExtractionAssignment, ExtractionManager};
use crate::tasks::CoverTaskContext;
use crate::visibility::{SightQuery, batch_line_of_sight};
use crate::world::{AgentInfo, World};

/// Runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub search: SearchConfig,
    /// Seed for extraction choice and squad offsets.
    pub seed: u64,
}

/// Work done by one [`TacticalRuntime::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    /// Cover finder steps executed across all agents.
    pub cover_steps: usize,
    /// Claimed candidates newly seen by a threat.
    pub spotted: usize,
    pub extraction_step: Option<Step>,
}

pub struct TacticalRuntime {
    config: RuntimeConfig,
    world: World,
    covers: HashMap<AgentId, AgentCover>,
    extraction: ExtractionManager,
    now: SimTime,
}

impl TacticalRuntime {
    pub fn builder() -> TacticalRuntimeBuilder {
        TacticalRuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Adds an agent and starts its cover finder.
    pub fn register_agent(&mut self, info: AgentInfo) -> Result<()> {
        if self.world.agent(info.id).is_some() {
            return Err(RuntimeError::DuplicateAgent(info.id));
        }
        let id = info.id;
        self.covers
            .insert(id, AgentCover::new(id, &self.config.search.cover));
        self.world.insert_agent(info);
        tracing::debug!(agent = %id, "agent registered");
        Ok(())
    }

    /// Updates what the host reports about an agent this frame.
    pub fn update_agent(
        &mut self,
        agent: AgentId,
        position: Vec3,
        threat: Option<Vec3>,
        decision: CombatDecision,
    ) -> Result<()> {
        let info = self
            .world
            .agents
            .get_mut(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;
        info.position = position;
        info.threat = threat;
        info.decision = decision;
        Ok(())
    }

    /// Replaces the zone list; search state for vanished zones is dropped on
    /// the next extraction pass.
    pub fn set_zones(&mut self, zones: Vec<ExtractionZone>) {
        self.world.zones = zones;
    }

    /// Runs one frame of cooperative work.
    pub fn tick(&mut self, env: SpatialEnv<'_>, now: SimTime) -> TickReport {
        self.now = now;
        let mut report = TickReport::default();

        let mut ids: Vec<AgentId> = self.covers.keys().copied().collect();
        ids.sort();
        for id in &ids {
            let (Some(cover), Some(info)) = (self.covers.get_mut(id), self.world.agents.get(id)) else {
                continue;
            };
            let mut ctx = CoverTaskContext {
                env,
                now,
                origin: info.position,
                threat: info.threat,
            };
            if cover.poll(&mut ctx).is_some() {
                report.cover_steps += 1;
            }
            cover.update_lifecycle(info.decision, now);
        }

        report.spotted = self.observe_claims(env, now);
        report.extraction_step = self.extraction.poll(env, &self.world, now);
        report
    }

    /// Checks, in one parallel batch, whether each agent's threat can see
    /// its claimed cover.
    fn observe_claims(&mut self, env: SpatialEnv<'_>, now: SimTime) -> usize {
        let threat_eye = Vec3::Y * self.config.search.cover.standing_height;
        let queries: Vec<SightQuery> = self
            .covers
            .iter()
            .filter_map(|(&agent, cover)| {
                let threat = self.world.agent(agent)?.threat?;
                let claimed = cover.pool().get(cover.lifecycle().claimed()?)?;
                Some(SightQuery {
                    agent,
                    from: threat + threat_eye,
                    to: claimed.position + Vec3::Y * claimed.pose_height,
                })
            })
            .collect();
        if queries.is_empty() {
            return 0;
        }

        batch_line_of_sight(env.sight(), &queries)
            .into_iter()
            .filter(|&(agent, visible)| {
                visible && self.covers.get_mut(&agent).is_some_and(|c| c.spot_claimed(now))
            })
            .count()
    }

    fn cover(&self, agent: AgentId) -> Result<&AgentCover> {
        self.covers.get(&agent).ok_or(RuntimeError::UnknownAgent(agent))
    }

    fn cover_mut(&mut self, agent: AgentId) -> Result<&mut AgentCover> {
        self.covers
            .get_mut(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))
    }

    /// The agent's pooled cover candidates, nearest path first.
    pub fn current_cover_pool(&self, agent: AgentId) -> Result<&[CoverCandidate]> {
        Ok(self.cover(agent)?.pool().candidates())
    }

    /// Candidates the agent may claim right now.
    pub fn selectable_cover(&self, agent: AgentId) -> Result<Vec<&CoverCandidate>> {
        let cover = self.cover(agent)?;
        Ok(cover
            .pool()
            .selectable(self.now, cover.finder().spotted(), agent)
            .collect())
    }

    /// Position to fall back to when no cover is in use.
    pub fn fallback_cover_point(&self, agent: AgentId) -> Result<Option<Vec3>> {
        Ok(self.cover(agent)?.finder().fallback())
    }

    /// First selectable candidate along `direction` from the agent's current
    /// position, within `min_dot` cosine and at least `min_distance` away.
    pub fn cover_in_direction(
        &self,
        agent: AgentId,
        direction: Vec3,
        min_dot: f32,
        min_distance: f32,
    ) -> Result<Option<&CoverCandidate>> {
        let info = self.world.agent(agent).ok_or(RuntimeError::UnknownAgent(agent))?;
        let cover = self.cover(agent)?;
        let query = DirectionQuery {
            from: info.position,
            direction,
            min_dot,
            min_distance,
        };
        Ok(cover
            .pool()
            .find_in_direction(query, self.now, cover.finder().spotted(), agent))
    }

    pub fn claim_cover(&mut self, agent: AgentId, candidate: CandidateId) -> Result<()> {
        self.cover_mut(agent)?.claim(candidate)
    }

    pub fn release_cover(&mut self, agent: AgentId) -> Result<()> {
        self.cover_mut(agent)?.release();
        Ok(())
    }

    /// Permanently disqualifies a candidate from the agent's pool.
    pub fn mark_cover_bad(&mut self, agent: AgentId, candidate: CandidateId) -> Result<bool> {
        Ok(self.cover_mut(agent)?.mark_bad(candidate))
    }

    pub fn cover_state(&self, agent: AgentId) -> Result<CoverState> {
        Ok(self.cover(agent)?.lifecycle().state())
    }

    /// Records a hit on the agent. Returns true if this spotted its cover.
    pub fn report_hit(&mut self, agent: AgentId) -> Result<bool> {
        let now = self.now;
        Ok(self.cover_mut(agent)?.on_hit(now))
    }

    pub fn subscribe_cover_events(
        &mut self,
        agent: AgentId,
        listener: impl FnMut(&CoverEvent) + Send + 'static,
    ) -> Result<SubscriptionId> {
        Ok(self.cover_mut(agent)?.subscribe(listener))
    }

    /// Extraction point for the agent, shared with its squad.
    pub fn find_extraction(
        &mut self,
        env: SpatialEnv<'_>,
        agent: AgentId,
    ) -> Result<Option<ExtractionAssignment>> {
        self.extraction.find(env, &self.world, agent, self.now)
    }

    /// Seconds left before the committed shared departure of `zone`.
    pub fn departure_remaining(&self, zone: ZoneId) -> Option<f32> {
        self.extraction.departure_remaining(zone, self.now)
    }

    pub fn validated_extraction(&self, zone: ZoneId) -> Option<Vec3> {
        self.extraction.resolver().validated_position(zone)
    }

    /// Checks the zone's current working position for a complete path from
    /// its spawn anchor.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Extraction`] when the zone has not been stepped yet or
    /// has no working position.
    pub fn validate_extraction(&mut self, env: SpatialEnv<'_>, zone: ZoneId) -> Result<bool> {
        Ok(self.extraction.validate(env, zone)?)
    }

    /// Cancels the agent's finder, releases its claim and drops its
    /// listeners and extraction state.
    pub fn dispose_agent(&mut self, agent: AgentId) -> Result<()> {
        let mut cover = self
            .covers
            .remove(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;
        cover.dispose();
        self.extraction.forget(agent);
        self.world.remove_agent(agent);
        tracing::debug!(%agent, "agent disposed");
        Ok(())
    }
}

/// Builder for [`TacticalRuntime`].
pub struct TacticalRuntimeBuilder {
    config: RuntimeConfig,
    zones: Vec<ExtractionZone>,
    spawns: Vec<SpawnMarker>,
}

impl TacticalRuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            zones: Vec::new(),
            spawns: Vec::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn zones(mut self, zones: Vec<ExtractionZone>) -> Self {
        self.zones = zones;
        self
    }

    pub fn spawns(mut self, spawns: Vec<SpawnMarker>) -> Self {
        self.spawns = spawns;
        self
    }

    /// Validates the configuration and builds the runtime.
    pub fn build(self) -> Result<TacticalRuntime> {
        self.config.search.validate()?;

        let world = World {
            zones: self.zones,
            spawns: self.spawns,
            ..World::default()
        };
        let extraction = ExtractionManager::new(
            self.config.search.extraction.clone(),
            StdRng::seed_from_u64(self.config.seed),
        );
        tracing::debug!(
            zones = world.zones.len(),
            spawns = world.spawns.len(),
            seed = self.config.seed,
            "tactical runtime built"
        );

        Ok(TacticalRuntime {
            config: self.config,
            world,
            covers: HashMap::new(),
            extraction,
            now: SimTime::ZERO,
        })
    }
}
