//! Bounded, path-ordered collection of cover candidates for one agent.
use std::collections::HashSet;

use glam::Vec3;

use super::candidate::{CandidateId, CoverCandidate};
use super::spotted::SpottedTracker;
use crate::config::CoverConfig;
use crate::geometry::{GeometryId, flatten};
use crate::types::{AgentId, SimTime};

/// Outcome of [`CandidatePool::admit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Admission {
    Admitted(CandidateId),
    /// The geometry was disqualified earlier.
    Bad,
    /// A candidate for the same geometry is already pooled.
    Duplicate,
    /// The pool is mature and the score does not beat its current minimum.
    BelowThreshold,
    Full,
}

impl Admission {
    pub fn is_admitted(self) -> bool {
        matches!(self, Admission::Admitted(_))
    }
}

/// Cover candidates ordered by ascending path length.
#[derive(Clone, Debug)]
pub struct CandidatePool {
    capacity: usize,
    maturity: usize,
    candidates: Vec<CoverCandidate>,
    bad_geometry: HashSet<GeometryId>,
    next_id: u32,
}

impl CandidatePool {
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            capacity: config.capacity,
            maturity: config.maturity,
            candidates: Vec::with_capacity(config.capacity),
            bad_geometry: HashSet::new(),
            next_id: 1,
        }
    }

    /// Offers an analysed candidate to the pool.
    ///
    /// Up to the maturity size everything is accepted; after that a candidate
    /// must beat the lowest score currently pooled.
    pub fn admit(&mut self, mut candidate: CoverCandidate) -> Admission {
        if candidate.is_bad || self.bad_geometry.contains(&candidate.geometry) {
            return Admission::Bad;
        }
        if self.contains_geometry(candidate.geometry) {
            return Admission::Duplicate;
        }
        if self.candidates.len() >= self.capacity {
            return Admission::Full;
        }
        if self.candidates.len() > self.maturity {
            let threshold = self.min_score().unwrap_or(f32::NEG_INFINITY);
            if candidate.cover_value <= threshold {
                return Admission::BelowThreshold;
            }
        }

        let id = CandidateId(self.next_id);
        self.next_id += 1;
        candidate.id = id;
        self.candidates.push(candidate);
        self.sort_by_path_length();
        Admission::Admitted(id)
    }

    /// Drops the worst third by score once the pool is full.
    ///
    /// Returns the number of candidates removed.
    pub fn cull(&mut self) -> usize {
        if self.candidates.len() < self.capacity {
            return 0;
        }
        let remove = (self.candidates.len() as f32 / 3.0).round() as usize;
        self.candidates
            .sort_by(|a, b| b.cover_value.total_cmp(&a.cover_value));
        self.candidates.truncate(self.candidates.len() - remove);
        self.sort_by_path_length();
        tracing::debug!(removed = remove, kept = self.candidates.len(), "cover pool culled");
        remove
    }

    /// Keeps only candidates for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&mut CoverCandidate) -> bool) -> usize {
        let before = self.candidates.len();
        self.candidates.retain_mut(|c| keep(c));
        before - self.candidates.len()
    }

    pub fn remove(&mut self, id: CandidateId) -> Option<CoverCandidate> {
        let index = self.candidates.iter().position(|c| c.id == id)?;
        Some(self.candidates.remove(index))
    }

    /// Permanently disqualifies the candidate and its geometry.
    pub fn mark_bad(&mut self, id: CandidateId) -> bool {
        let Some(candidate) = self.candidates.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        candidate.is_bad = true;
        self.bad_geometry.insert(candidate.geometry);
        tracing::debug!(candidate = %id, geometry = %candidate.geometry, "cover marked bad");
        true
    }

    pub fn is_bad_geometry(&self, geometry: GeometryId) -> bool {
        self.bad_geometry.contains(&geometry)
    }

    /// Candidates an agent may pick right now, nearest path first.
    pub fn selectable<'a>(
        &'a self,
        now: SimTime,
        spotted: &'a SpottedTracker,
        agent: AgentId,
    ) -> impl Iterator<Item = &'a CoverCandidate> + 'a {
        self.candidates.iter().filter(move |c| {
            !c.is_bad
                && !c.is_spotted(now)
                && !spotted.is_spotted(c.position, now)
                && !c.is_occupied_by_other(agent)
        })
    }

    /// Tallest candidate with a safe path, else the tallest overall.
    pub fn find_fallback_point(&self) -> Option<&CoverCandidate> {
        let tallest = |safe_only: bool| {
            self.candidates
                .iter()
                .filter(|c| !c.is_bad && (!safe_only || c.is_safe_path))
                .max_by(|a, b| a.bounds.height().total_cmp(&b.bounds.height()))
        };
        tallest(true).or_else(|| tallest(false))
    }

    /// First selectable candidate lying roughly along `direction` from the
    /// agent and at least `min_distance` away.
    pub fn find_in_direction<'a>(
        &'a self,
        query: DirectionQuery,
        now: SimTime,
        spotted: &'a SpottedTracker,
        agent: AgentId,
    ) -> Option<&'a CoverCandidate> {
        let direction = flatten(query.direction).normalize_or_zero();
        if direction == Vec3::ZERO {
            return None;
        }
        self.selectable(now, spotted, agent).find(|c| {
            let offset = flatten(c.position - query.from);
            let distance = offset.length();
            distance >= query.min_distance && offset.dot(direction) / distance >= query.min_dot
        })
    }

    /// Lowest score in the pool, recomputed on every call.
    pub fn min_score(&self) -> Option<f32> {
        self.candidates
            .iter()
            .map(|c| c.cover_value)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn contains_geometry(&self, geometry: GeometryId) -> bool {
        self.candidates.iter().any(|c| c.geometry == geometry)
    }

    pub fn get(&self, id: CandidateId) -> Option<&CoverCandidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CandidateId) -> Option<&mut CoverCandidate> {
        self.candidates.iter_mut().find(|c| c.id == id)
    }

    pub fn candidates(&self) -> &[CoverCandidate] {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut [CoverCandidate] {
        &mut self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.candidates.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }

    fn sort_by_path_length(&mut self) {
        self.candidates
            .sort_by(|a, b| a.path_length.total_cmp(&b.path_length));
    }
}

/// Parameters for [`CandidatePool::find_in_direction`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionQuery {
    pub from: Vec3,
    pub direction: Vec3,
    /// Minimum cosine between `direction` and the offset to the candidate.
    pub min_dot: f32,
    pub min_distance: f32,
}
