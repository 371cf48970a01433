//! Per-agent state machine for the claimed cover candidate.
use super::candidate::CandidateId;
use super::pool::CandidatePool;
use super::spotted::SpottedTracker;
use crate::error::{ErrorSeverity, TacticalError};
use crate::events::{Observers, SubscriptionId};
use crate::types::{AgentId, CombatDecision, SimTime};

/// Where the agent stands relative to its claimed cover.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CoverState {
    #[default]
    Idle,
    MovingToCover,
    InCover,
    SpottedInCover,
}

/// Notifications published to lifecycle observers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CoverEvent {
    NewCoverInUse {
        agent: AgentId,
        candidate: CandidateId,
    },
    /// First arrival since the candidate was claimed.
    EnteredCover {
        agent: AgentId,
        candidate: CandidateId,
    },
    SpottedInCover {
        agent: AgentId,
        candidate: CandidateId,
        until: SimTime,
    },
}

/// Why a claim was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("cover candidate {0} is not in the pool")]
    Missing(CandidateId),

    #[error("cover candidate {0} is disqualified")]
    Bad(CandidateId),

    #[error("cover candidate {candidate} is occupied by agent {occupant}")]
    Occupied {
        candidate: CandidateId,
        occupant: AgentId,
    },
}

impl TacticalError for ClaimError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "CLAIM_MISSING",
            Self::Bad(_) => "CLAIM_BAD",
            Self::Occupied { .. } => "CLAIM_OCCUPIED",
        }
    }
}

/// Reason a claim was dropped by [`CoverLifecycle::check_reset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResetReason {
    Missing,
    Bad,
    Decision,
}

#[derive(Debug)]
pub struct CoverLifecycle {
    agent: AgentId,
    claimed: Option<CandidateId>,
    state: CoverState,
    entered: bool,
    last_hit: Option<SimTime>,
    observers: Observers<CoverEvent>,
}

impl CoverLifecycle {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            claimed: None,
            state: CoverState::Idle,
            entered: false,
            last_hit: None,
            observers: Observers::new(),
        }
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn state(&self) -> CoverState {
        self.state
    }

    pub fn claimed(&self) -> Option<CandidateId> {
        self.claimed
    }

    pub fn last_hit(&self) -> Option<SimTime> {
        self.last_hit
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CoverEvent) + Send + 'static) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.observers.len()
    }

    /// Claims `id` for this agent, releasing any previous claim.
    pub fn claim(&mut self, pool: &mut CandidatePool, id: CandidateId) -> Result<(), ClaimError> {
        let candidate = pool.get(id).ok_or(ClaimError::Missing(id))?;
        if candidate.is_bad {
            return Err(ClaimError::Bad(id));
        }
        if let Some(occupant) = candidate.occupant.filter(|&o| o != self.agent) {
            return Err(ClaimError::Occupied {
                candidate: id,
                occupant,
            });
        }

        if self.claimed.is_some_and(|current| current != id) {
            self.release(pool);
        }
        if let Some(candidate) = pool.get_mut(id) {
            candidate.occupant = Some(self.agent);
        }
        self.claimed = Some(id);
        self.state = CoverState::MovingToCover;
        self.entered = false;

        tracing::debug!(agent = %self.agent, candidate = %id, "cover claimed");
        self.observers.notify(&CoverEvent::NewCoverInUse {
            agent: self.agent,
            candidate: id,
        });
        Ok(())
    }

    /// Drops the current claim, if any.
    pub fn release(&mut self, pool: &mut CandidatePool) {
        if let Some(id) = self.claimed.take() {
            if let Some(candidate) = pool.get_mut(id)
                && candidate.occupant == Some(self.agent)
            {
                candidate.occupant = None;
            }
            tracing::debug!(agent = %self.agent, candidate = %id, "cover released");
        }
        self.state = CoverState::Idle;
        self.entered = false;
    }

    /// Releases the claim if the candidate vanished, went bad, or the
    /// decision no longer calls for cover.
    pub fn check_reset(
        &mut self,
        pool: &mut CandidatePool,
        decision: CombatDecision,
    ) -> Option<ResetReason> {
        let id = self.claimed?;
        let reason = match pool.get(id) {
            None => ResetReason::Missing,
            Some(candidate) if candidate.is_bad => ResetReason::Bad,
            Some(_) if !decision.keeps_cover() => ResetReason::Decision,
            Some(_) => return None,
        };
        tracing::debug!(agent = %self.agent, candidate = %id, %reason, "cover claim reset");
        self.release(pool);
        Some(reason)
    }

    /// Recomputes the state from the claimed candidate's distance categories.
    pub fn update(
        &mut self,
        pool: &mut CandidatePool,
        decision: CombatDecision,
        now: SimTime,
    ) -> CoverState {
        self.check_reset(pool, decision);
        let Some(candidate) = self.claimed.and_then(|id| pool.get(id)) else {
            self.state = CoverState::Idle;
            return self.state;
        };

        let arrived = !candidate.straight_status.is_movement() && !candidate.path_status.is_movement();
        self.state = match (arrived, candidate.is_spotted(now)) {
            (false, _) => CoverState::MovingToCover,
            (true, true) => CoverState::SpottedInCover,
            (true, false) => CoverState::InCover,
        };

        if arrived && !self.entered {
            self.entered = true;
            let id = candidate.id;
            tracing::debug!(agent = %self.agent, candidate = %id, "entered cover");
            self.observers.notify(&CoverEvent::EnteredCover {
                agent: self.agent,
                candidate: id,
            });
        }
        self.state
    }

    /// Registers a hit taken by the agent.
    ///
    /// While in cover the candidate becomes spotted; the first transition
    /// records a spotted entry and notifies observers.
    pub fn on_hit(
        &mut self,
        pool: &mut CandidatePool,
        spotted: &mut SpottedTracker,
        period: f32,
        now: SimTime,
    ) -> bool {
        if !matches!(self.state, CoverState::InCover | CoverState::SpottedInCover) {
            return false;
        }
        self.last_hit = Some(now);
        let Some(candidate) = self.claimed.and_then(|id| pool.get_mut(id)) else {
            return false;
        };
        if !candidate.mark_spotted(now, period) {
            return false;
        }

        let entry = spotted.record(candidate.position, now);
        self.state = CoverState::SpottedInCover;
        let event = CoverEvent::SpottedInCover {
            agent: self.agent,
            candidate: candidate.id,
            until: entry.expires_at,
        };
        tracing::debug!(agent = %self.agent, candidate = %candidate.id, "spotted in cover");
        self.observers.notify(&event);
        true
    }

    /// Releases the claim and removes every subscription.
    pub fn dispose(&mut self, pool: &mut CandidatePool) {
        self.release(pool);
        self.observers.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use glam::Vec3;

    use super::*;
    use crate::config::CoverConfig;
    use crate::cover::{Admission, CoverStatus};
    use crate::testing::candidate;

    fn setup() -> (CandidatePool, CandidateId) {
        let mut pool = CandidatePool::new(&CoverConfig::default());
        let Admission::Admitted(id) = pool.admit(candidate(1, Vec3::new(30.0, 0.0, 0.0), 30.0, 5.0))
        else {
            panic!("expected admission");
        };
        (pool, id)
    }

    fn recorder(lifecycle: &mut CoverLifecycle) -> Arc<Mutex<Vec<CoverEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        lifecycle.subscribe(move |e| sink.lock().unwrap().push(*e));
        events
    }

    fn set_status(pool: &mut CandidatePool, id: CandidateId, straight: CoverStatus, path: CoverStatus) {
        let c = pool.get_mut(id).unwrap();
        c.straight_status = straight;
        c.path_status = path;
    }

    #[test]
    fn moving_until_both_categories_arrive() {
        let (mut pool, id) = setup();
        let mut lifecycle = CoverLifecycle::new(AgentId(1));
        let events = recorder(&mut lifecycle);
        lifecycle.claim(&mut pool, id).unwrap();

        set_status(&mut pool, id, CoverStatus::InCover, CoverStatus::FarFromCover);
        let now = SimTime(1.0);
        assert_eq!(lifecycle.update(&mut pool, CombatDecision::MoveToCover, now), CoverState::MovingToCover);

        set_status(&mut pool, id, CoverStatus::InCover, CoverStatus::None);
        assert_eq!(lifecycle.update(&mut pool, CombatDecision::HoldInCover, now), CoverState::InCover);
        assert_eq!(lifecycle.update(&mut pool, CombatDecision::HoldInCover, now), CoverState::InCover);

        let entered = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CoverEvent::EnteredCover { .. }))
            .count();
        assert_eq!(entered, 1);
    }

    #[test]
    fn hit_in_cover_spots_once() {
        let (mut pool, id) = setup();
        let mut spotted = SpottedTracker::new(&CoverConfig::default());
        let mut lifecycle = CoverLifecycle::new(AgentId(1));
        let events = recorder(&mut lifecycle);
        lifecycle.claim(&mut pool, id).unwrap();

        assert!(!lifecycle.on_hit(&mut pool, &mut spotted, 10.0, SimTime(0.5)));
        set_status(&mut pool, id, CoverStatus::InCover, CoverStatus::InCover);
        lifecycle.update(&mut pool, CombatDecision::HoldInCover, SimTime(1.0));

        assert!(lifecycle.on_hit(&mut pool, &mut spotted, 10.0, SimTime(2.0)));
        assert!(!lifecycle.on_hit(&mut pool, &mut spotted, 10.0, SimTime(3.0)));
        assert_eq!(lifecycle.state(), CoverState::SpottedInCover);
        assert_eq!(lifecycle.last_hit(), Some(SimTime(3.0)));
        assert_eq!(spotted.len(), 1);

        let spotted_events = events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, CoverEvent::SpottedInCover { .. }))
            .count();
        assert_eq!(spotted_events, 1);
        assert_eq!(lifecycle.update(&mut pool, CombatDecision::HoldInCover, SimTime(12.5)), CoverState::InCover);
    }

    #[test]
    fn claim_resets_on_decision_bad_or_missing() {
        let (mut pool, id) = setup();
        let mut lifecycle = CoverLifecycle::new(AgentId(1));

        lifecycle.claim(&mut pool, id).unwrap();
        assert_eq!(lifecycle.check_reset(&mut pool, CombatDecision::Search), Some(ResetReason::Decision));
        assert_eq!(pool.get(id).and_then(|c| c.occupant), None);

        lifecycle.claim(&mut pool, id).unwrap();
        pool.mark_bad(id);
        assert_eq!(lifecycle.check_reset(&mut pool, CombatDecision::Retreat), Some(ResetReason::Bad));
        assert_eq!(lifecycle.claim(&mut pool, id), Err(ClaimError::Bad(id)));

        let (mut pool, id) = setup();
        lifecycle.claim(&mut pool, id).unwrap();
        pool.remove(id);
        assert_eq!(lifecycle.update(&mut pool, CombatDecision::Retreat, SimTime(1.0)), CoverState::Idle);
        assert_eq!(lifecycle.claimed(), None);
    }

    #[test]
    fn occupied_by_other_agent_is_refused_and_dispose_clears() {
        let (mut pool, id) = setup();
        let mut first = CoverLifecycle::new(AgentId(1));
        let mut second = CoverLifecycle::new(AgentId(2));
        recorder(&mut first);

        first.claim(&mut pool, id).unwrap();
        assert_eq!(
            second.claim(&mut pool, id),
            Err(ClaimError::Occupied {
                candidate: id,
                occupant: AgentId(1)
            })
        );

        first.dispose(&mut pool);
        assert_eq!(first.listener_count(), 0);
        assert!(second.claim(&mut pool, id).is_ok());
    }
}
