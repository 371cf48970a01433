use std::fmt;
use std::ops::{Add, Sub};

/// Unique identifier for an agent taking part in the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a squad (group of agents sharing decisions).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SquadId(pub u32);

/// Simulated time in seconds since the session started.
///
/// Wraps `f32` the same way the host engine reports frame time. Comparisons
/// are plain float comparisons; the simulation never produces NaN times.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f32);

impl SimTime {
    pub const ZERO: Self = Self(0.0);

    pub const fn new(seconds: f32) -> Self {
        Self(seconds)
    }

    pub const fn seconds(self) -> f32 {
        self.0
    }
}

impl Add<f32> for SimTime {
    type Output = SimTime;
    fn add(self, rhs: f32) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

/// Elapsed seconds between two instants.
impl Sub for SimTime {
    type Output = f32;
    fn sub(self, rhs: SimTime) -> f32 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.0)
    }
}

/// Broad role of an agent. Decides which extraction zones it may use.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Faction {
    #[default]
    Pmc,
    Scav,
    Boss,
    Follower,
}

impl Faction {
    /// Only raiders and scavengers leave the map on their own.
    pub const fn may_extract(self) -> bool {
        matches!(self, Faction::Pmc | Faction::Scav)
    }
}

/// High-level combat decision owned by the external decision layer.
///
/// The cover lifecycle only needs to know whether the current decision is one
/// that keeps a claimed cover point alive.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CombatDecision {
    #[default]
    None,
    MoveToCover,
    RunToCover,
    Retreat,
    HoldInCover,
    ShiftCover,
    Search,
    ShootDistantEnemy,
    StandAndShoot,
    RushEnemy,
    Freeze,
}

impl CombatDecision {
    /// Decisions under which a claimed cover point stays claimed.
    pub const fn keeps_cover(self) -> bool {
        matches!(
            self,
            CombatDecision::MoveToCover
                | CombatDecision::RunToCover
                | CombatDecision::Retreat
                | CombatDecision::HoldInCover
                | CombatDecision::ShiftCover
        )
    }
}
