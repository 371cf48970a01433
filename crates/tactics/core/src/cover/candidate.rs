use std::fmt;

use glam::Vec3;

use crate::config::CoverConfig;
use crate::geometry::{Bounds, GeometryId};
use crate::types::{AgentId, SimTime};

/// Identifier of a cover candidate inside one agent's pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateId(pub u32);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cover#{}", self.0)
    }
}

/// Distance category between an agent and a cover candidate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CoverStatus {
    /// Not measured yet.
    #[default]
    None,
    InCover,
    CloseToCover,
    MidRangeToCover,
    FarFromCover,
}

impl CoverStatus {
    /// Buckets a distance using the configured thresholds.
    pub fn classify(distance: f32, config: &CoverConfig) -> Self {
        if distance <= config.in_cover_distance {
            Self::InCover
        } else if distance <= config.close_distance {
            Self::CloseToCover
        } else if distance <= config.mid_distance {
            Self::MidRangeToCover
        } else {
            Self::FarFromCover
        }
    }

    /// True while the agent still has to travel to reach the candidate.
    pub const fn is_movement(self) -> bool {
        matches!(
            self,
            Self::CloseToCover | Self::MidRangeToCover | Self::FarFromCover
        )
    }
}

/// A validated, scored position behind a piece of static geometry.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoverCandidate {
    pub id: CandidateId,
    pub geometry: GeometryId,
    pub bounds: Bounds,
    pub position: Vec3,
    /// Navigation path length from the search origin.
    pub path_length: f32,
    pub straight_status: CoverStatus,
    pub path_status: CoverStatus,
    pub cover_value: f32,
    /// Eye height at which the geometry blocks the threat's line of sight.
    pub pose_height: f32,
    pub is_safe_path: bool,
    pub spotted_until: Option<SimTime>,
    pub is_bad: bool,
    pub occupant: Option<AgentId>,
}

impl CoverCandidate {
    /// Refreshes both distance categories relative to `agent_position`.
    pub fn update_status(&mut self, agent_position: Vec3, path_length: Option<f32>, config: &CoverConfig) {
        self.straight_status = CoverStatus::classify(agent_position.distance(self.position), config);
        self.path_status = match path_length {
            Some(length) => CoverStatus::classify(length, config),
            None => CoverStatus::FarFromCover,
        };
    }

    /// Marks the candidate as seen by a threat.
    ///
    /// Returns true only on the transition from not spotted to spotted.
    pub fn mark_spotted(&mut self, now: SimTime, period: f32) -> bool {
        let newly = !self.is_spotted(now);
        if newly {
            self.spotted_until = Some(now + period);
        }
        newly
    }

    pub fn is_spotted(&self, now: SimTime) -> bool {
        self.spotted_until.is_some_and(|until| now < until)
    }

    pub fn is_occupied_by_other(&self, agent: AgentId) -> bool {
        self.occupant.is_some_and(|occupant| occupant != agent)
    }
}
