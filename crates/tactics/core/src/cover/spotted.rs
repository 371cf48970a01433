//! Time-boxed memory of positions a threat has seen.
use glam::Vec3;

use crate::config::CoverConfig;
use crate::types::SimTime;

/// A position observed by a threat and the time the observation lapses.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpottedEntry {
    pub position: Vec3,
    pub expires_at: SimTime,
}

impl SpottedEntry {
    pub fn is_live(&self, now: SimTime) -> bool {
        now < self.expires_at
    }
}

/// Suppresses candidates near recently spotted positions.
///
/// Entries outlive the candidates that produced them, so a candidate
/// re-created by a later scan pass at the same spot stays suppressed.
#[derive(Clone, Debug)]
pub struct SpottedTracker {
    entries: Vec<SpottedEntry>,
    period: f32,
    proximity_sq: f32,
    cleanup_interval: f32,
    last_cleanup: Option<SimTime>,
}

impl SpottedTracker {
    pub fn new(config: &CoverConfig) -> Self {
        Self {
            entries: Vec::new(),
            period: config.spotted_period,
            proximity_sq: config.spotted_proximity * config.spotted_proximity,
            cleanup_interval: config.spotted_cleanup_interval,
            last_cleanup: None,
        }
    }

    /// Records an observation lasting one suppression period from `now`.
    pub fn record(&mut self, position: Vec3, now: SimTime) -> SpottedEntry {
        let entry = SpottedEntry {
            position,
            expires_at: now + self.period,
        };
        self.entries.push(entry);
        tracing::debug!(?position, expires_at = %entry.expires_at, "position spotted");
        entry
    }

    /// True if a live entry lies within the proximity tolerance.
    pub fn is_spotted(&self, position: Vec3, now: SimTime) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_live(now) && e.position.distance_squared(position) <= self.proximity_sq)
    }

    /// Runs [`cleanup`](Self::cleanup) if the cleanup interval has elapsed.
    pub fn maybe_cleanup(&mut self, now: SimTime) -> Option<usize> {
        let due = self
            .last_cleanup
            .is_none_or(|last| now - last >= self.cleanup_interval);
        due.then(|| self.cleanup(now))
    }

    /// Drops expired entries and returns how many were removed.
    pub fn cleanup(&mut self, now: SimTime) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.is_live(now));
        self.last_cleanup = Some(now);
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::trace!(removed, "spotted entries expired");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
