use glam::Vec3;

use super::zone::ZoneId;

/// Nearest spawn resolution, done once per zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpawnAnchor {
    Unresolved,
    Resolved(Vec3),
    /// No marker projected onto the navigation mesh.
    Missing,
}

/// Incremental search state for one zone.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractionCandidate {
    pub zone: ZoneId,
    pub search_radius: f32,
    /// Untested points; `pop` yields the next one to try.
    pub test_points: Vec<Vec3>,
    pub working: Option<Vec3>,
    pub spawn: SpawnAnchor,
    pub validated: bool,
}

impl ExtractionCandidate {
    pub fn new(zone: ZoneId, search_radius: f32, test_points: Vec<Vec3>) -> Self {
        Self {
            zone,
            search_radius,
            test_points,
            working: None,
            spawn: SpawnAnchor::Unresolved,
            validated: false,
        }
    }

    /// The validated position, if the search has succeeded.
    pub fn validated_position(&self) -> Option<Vec3> {
        self.working.filter(|_| self.validated)
    }

    pub fn is_exhausted(&self) -> bool {
        !self.validated && self.test_points.is_empty()
    }
}

/// Outcome of one resolver step for one zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneStep {
    /// The zone has a permanent validated position.
    Validated(Vec3),
    /// A point was tried and failed; more remain.
    Pending,
    /// Every test point failed.
    Exhausted,
    /// No spawn marker is usable as a path start.
    NoSpawn,
}
