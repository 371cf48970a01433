//! Commit-once departure times for shared-timer zones.
use std::collections::HashMap;

use super::zone::ZoneId;
use crate::types::SimTime;

#[derive(Clone, Debug, Default)]
pub struct DepartureSchedule {
    times: HashMap<ZoneId, SimTime>,
    margin: f32,
}

impl DepartureSchedule {
    pub fn new(margin: f32) -> Self {
        Self {
            times: HashMap::new(),
            margin,
        }
    }

    /// Returns the departure time for `zone`, committing
    /// `now + duration + margin` on first use.
    pub fn commit(&mut self, zone: ZoneId, now: SimTime, duration: f32) -> SimTime {
        let margin = self.margin;
        *self.times.entry(zone).or_insert_with(|| {
            let at = now + (duration + margin);
            tracing::debug!(%zone, departs_at = %at, "shared departure committed");
            at
        })
    }

    pub fn departure(&self, zone: ZoneId) -> Option<SimTime> {
        self.times.get(&zone).copied()
    }

    /// Seconds until the committed departure; negative once it has passed.
    pub fn remaining(&self, zone: ZoneId, now: SimTime) -> Option<f32> {
        self.departure(zone).map(|at| at - now)
    }
}
