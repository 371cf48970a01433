//! Per-agent cover state: the perpetual finder task plus the claim lifecycle.
use scheduler::{Step, TaskSlot};
use tactics_core::{
    AgentId, CandidateId, CandidatePool, CombatDecision, CoverConfig, CoverEvent, CoverLifecycle,
    CoverState, SimTime, SubscriptionId,
};

use crate::api::Result;
use crate::tasks::{CoverFinderTask, CoverTaskContext};

#[derive(Debug)]
pub struct AgentCover {
    slot: TaskSlot<CoverFinderTask>,
    lifecycle: CoverLifecycle,
    spotted_period: f32,
}

impl AgentCover {
    pub fn new(agent: AgentId, config: &CoverConfig) -> Self {
        Self {
            slot: TaskSlot::new(CoverFinderTask::new(config.clone())),
            lifecycle: CoverLifecycle::new(agent),
            spotted_period: config.spotted_period,
        }
    }

    /// Drops a stale fallback point, then steps the finder once if it is
    /// awake.
    pub fn poll(&mut self, ctx: &mut CoverTaskContext<'_>) -> Option<Step> {
        self.slot.task_mut().check_reset_fallback(ctx.origin, ctx.now);
        let now = ctx.now.seconds();
        self.slot.poll(ctx, now)
    }

    /// Refreshes the lifecycle against the latest pool contents.
    pub fn update_lifecycle(&mut self, decision: CombatDecision, now: SimTime) -> CoverState {
        self.lifecycle
            .update(self.slot.task_mut().pool_mut(), decision, now)
    }

    pub fn pool(&self) -> &CandidatePool {
        self.slot.task().pool()
    }

    pub fn finder(&self) -> &CoverFinderTask {
        self.slot.task()
    }

    pub fn lifecycle(&self) -> &CoverLifecycle {
        &self.lifecycle
    }

    pub fn claim(&mut self, candidate: CandidateId) -> Result<()> {
        self.lifecycle
            .claim(self.slot.task_mut().pool_mut(), candidate)?;
        Ok(())
    }

    pub fn release(&mut self) {
        self.lifecycle.release(self.slot.task_mut().pool_mut());
    }

    /// Disqualifies a candidate for the rest of the session.
    pub fn mark_bad(&mut self, candidate: CandidateId) -> bool {
        self.slot.task_mut().pool_mut().mark_bad(candidate)
    }

    /// Marks the claimed candidate as seen by a threat.
    pub fn spot_claimed(&mut self, now: SimTime) -> bool {
        let Some(id) = self.lifecycle.claimed() else {
            return false;
        };
        let (pool, spotted) = self.slot.task_mut().parts_mut();
        let Some(candidate) = pool.get_mut(id) else {
            return false;
        };
        if candidate.mark_spotted(now, self.spotted_period) {
            spotted.record(candidate.position, now);
            return true;
        }
        false
    }

    pub fn on_hit(&mut self, now: SimTime) -> bool {
        let (pool, spotted) = self.slot.task_mut().parts_mut();
        self.lifecycle.on_hit(pool, spotted, self.spotted_period, now)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CoverEvent) + Send + 'static) -> SubscriptionId {
        self.lifecycle.subscribe(listener)
    }

    pub fn is_running(&self) -> bool {
        self.slot.is_active()
    }

    /// Cancels the finder before releasing the claim and dropping listeners.
    pub fn dispose(&mut self) {
        self.slot.cancel();
        self.lifecycle.dispose(self.slot.task_mut().pool_mut());
    }
}
