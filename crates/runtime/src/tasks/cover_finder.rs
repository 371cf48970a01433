//! Per-agent perpetual cover search.
//!
//! One pass runs, one unit per step:
//! spotted cleanup → recheck each pooled candidate → cull → scan →
//! analyse scanned geometry → publish the fallback point and sleep.
use glam::Vec3;
use scheduler::{Step, Task};
use tactics_core::{
    CandidateAnalyzer, CandidatePool, CoverConfig, GeometryScanner, SearchFrame, SimTime,
    SpatialEnv, SpottedTracker,
};

/// What the cover finder can see during one tick.
pub struct CoverTaskContext<'a> {
    pub env: SpatialEnv<'a>,
    pub now: SimTime,
    /// Current agent position.
    pub origin: Vec3,
    /// Position of the threat the agent hides from, if any.
    pub threat: Option<Vec3>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Cleanup,
    Recheck { index: usize },
    Scan,
    Analyze { next: usize },
    Finish,
}

/// Resumable cover search owning the agent's pool.
#[derive(Debug)]
pub struct CoverFinderTask {
    config: CoverConfig,
    analyzer: CandidateAnalyzer,
    scanner: GeometryScanner,
    pool: CandidatePool,
    spotted: SpottedTracker,
    phase: Phase,
    last_admission_origin: Option<Vec3>,
    fallback: Option<Vec3>,
    /// Fallback recomputation is suppressed until then after a reset.
    fallback_hold: SimTime,
    admitted_this_pass: usize,
    passes: u64,
}

impl CoverFinderTask {
    pub fn new(config: CoverConfig) -> Self {
        Self {
            analyzer: CandidateAnalyzer::new(config.clone()),
            scanner: GeometryScanner::new(&config),
            pool: CandidatePool::new(&config),
            spotted: SpottedTracker::new(&config),
            config,
            phase: Phase::Cleanup,
            last_admission_origin: None,
            fallback: None,
            fallback_hold: SimTime::ZERO,
            admitted_this_pass: 0,
            passes: 0,
        }
    }

    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut CandidatePool {
        &mut self.pool
    }

    pub fn spotted(&self) -> &SpottedTracker {
        &self.spotted
    }

    /// Pool and spotted tracker together, for callers that update both.
    pub fn parts_mut(&mut self) -> (&mut CandidatePool, &mut SpottedTracker) {
        (&mut self.pool, &mut self.spotted)
    }

    /// Fallback point computed at the end of the last pass.
    pub fn fallback(&self) -> Option<Vec3> {
        self.fallback
    }

    /// Drops the fallback point once the agent has moved too far from it.
    ///
    /// Runs every tick, also while the task sleeps. After a drop no new
    /// fallback is published until the reset delay has elapsed.
    pub fn check_reset_fallback(&mut self, origin: Vec3, now: SimTime) -> bool {
        let Some(fallback) = self.fallback else {
            return false;
        };
        if now < self.fallback_hold {
            return false;
        }
        let limit = self.config.fallback_reset_distance;
        if origin.distance_squared(fallback) <= limit * limit {
            return false;
        }
        self.fallback = None;
        self.fallback_hold = now + self.config.fallback_reset_delay;
        tracing::debug!(?fallback, distance = origin.distance(fallback), "fallback point reset");
        true
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    fn needs_admission(&self, origin: Vec3) -> bool {
        if self.pool.len() < self.config.min_healthy_pool {
            return true;
        }
        self.last_admission_origin.is_none_or(|last| {
            last.distance_squared(origin) > self.config.admission_distance * self.config.admission_distance
        })
    }

    fn recheck_one(&mut self, ctx: &CoverTaskContext<'_>, index: usize) -> bool {
        let Some(candidate) = self.pool.candidates_mut().get_mut(index) else {
            return false;
        };
        let keep = !candidate.is_bad
            && !candidate.is_spotted(ctx.now)
            && !self.spotted.is_spotted(candidate.position, ctx.now)
            && self
                .analyzer
                .recheck(ctx.env, candidate, ctx.origin, ctx.threat);
        if !keep {
            let id = candidate.id;
            tracing::trace!(candidate = %id, "recheck removed candidate");
            self.pool.remove(id);
        }
        keep
    }

    fn finish_pass(&mut self, now: SimTime) -> Step {
        if now >= self.fallback_hold {
            self.fallback = self.pool.find_fallback_point().map(|c| c.position);
        }
        self.passes += 1;
        self.phase = Phase::Cleanup;

        tracing::debug!(
            pool = self.pool.len(),
            admitted = self.admitted_this_pass,
            fallback = ?self.fallback,
            "cover pass complete"
        );
        let delay = if self.pool.is_empty() {
            self.config.retry_delay
        } else {
            self.config.update_interval
        };
        self.admitted_this_pass = 0;
        Step::Sleep(delay)
    }
}

impl<'a> Task<CoverTaskContext<'a>> for CoverFinderTask {
    fn step(&mut self, ctx: &mut CoverTaskContext<'a>) -> Step {
        let frame = ctx.threat.map(|threat| SearchFrame {
            origin: ctx.origin,
            threat,
        });

        match self.phase {
            Phase::Cleanup => {
                self.spotted.maybe_cleanup(ctx.now);
                self.phase = Phase::Recheck { index: 0 };
                Step::Yield
            }
            Phase::Recheck { index } => {
                if index >= self.pool.len() {
                    self.pool.cull();
                    self.phase = Phase::Scan;
                    return Step::Yield;
                }
                let kept = self.recheck_one(ctx, index);
                self.phase = Phase::Recheck {
                    index: if kept { index + 1 } else { index },
                };
                Step::Yield
            }
            Phase::Scan => {
                if frame.is_none() || !self.needs_admission(ctx.origin) {
                    self.phase = Phase::Finish;
                    return Step::Yield;
                }
                let kind = self.scanner.scan(ctx.env.geometry(), ctx.origin);
                tracing::trace!(?kind, found = self.scanner.results().len(), "cover scan");
                self.last_admission_origin = Some(ctx.origin);
                self.phase = Phase::Analyze { next: 0 };
                Step::Yield
            }
            Phase::Analyze { next } => {
                let Some(frame) = frame else {
                    self.phase = Phase::Finish;
                    return Step::Yield;
                };
                let batch = if self.pool.is_empty() {
                    self.config.empty_pool_batch.max(1)
                } else {
                    1
                };
                let results = self.scanner.results();
                let end = (next + batch).min(results.len());

                for geometry in &results[next..end] {
                    if self.pool.contains_geometry(geometry.id) || self.pool.is_bad_geometry(geometry.id) {
                        continue;
                    }
                    if let Some(candidate) = self.analyzer.analyze(ctx.env, geometry, frame)
                        && !self.spotted.is_spotted(candidate.position, ctx.now)
                        && self.pool.admit(candidate).is_admitted()
                    {
                        self.admitted_this_pass += 1;
                    }
                }

                self.phase = if end >= results.len() {
                    Phase::Finish
                } else {
                    Phase::Analyze { next: end }
                };
                Step::Yield
            }
            Phase::Finish => self.finish_pass(ctx.now),
        }
    }
}
