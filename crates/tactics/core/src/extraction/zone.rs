use std::fmt;

use bitflags::bitflags;
use glam::Vec3;

use crate::geometry::Bounds;
use crate::types::Faction;

/// Identifier of an extraction zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// Availability reported by the host for a zone.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ZoneStatus {
    NotPresent,
    UncompleteRequirements,
    Countdown,
    #[default]
    RegularMode,
    Pending,
    AwaitsManualActivation,
}

bitflags! {
    /// Conditions a zone imposes before it can be used.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Requirements: u8 {
        const COOPERATION = 1 << 0;
        const TRAIN = 1 << 1;
        const WORLD_EVENT = 1 << 2;
        const PAYMENT = 1 << 3;
    }
}

/// How departure through a zone is timed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ExfilKind {
    /// Each agent runs its own countdown.
    #[default]
    Individual,
    /// One countdown shared by everyone who uses the zone.
    SharedTimer,
}

/// Which population a zone serves.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Audience {
    #[default]
    Main,
    Scav,
}

impl Audience {
    pub const fn for_faction(faction: Faction) -> Self {
        match faction {
            Faction::Scav => Audience::Scav,
            _ => Audience::Main,
        }
    }
}

/// A region agents may leave the map through.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtractionZone {
    pub id: ZoneId,
    pub name: String,
    pub status: ZoneStatus,
    pub requirements: Requirements,
    pub kind: ExfilKind,
    pub audience: Audience,
    /// Nominal position reported by the host (the trigger's transform).
    pub position: Vec3,
    /// Seconds an agent must wait inside the zone.
    pub duration: f32,
    bounds: Bounds,
}

impl ExtractionZone {
    pub fn new(id: ZoneId, name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id,
            name: name.into(),
            status: ZoneStatus::default(),
            requirements: Requirements::empty(),
            kind: ExfilKind::default(),
            audience: Audience::default(),
            position: bounds.center,
            duration: 0.0,
            bounds,
        }
    }

    pub fn with_status(mut self, status: ZoneStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_requirements(mut self, requirements: Requirements) -> Self {
        self.requirements = requirements;
        self
    }

    pub fn with_kind(mut self, kind: ExfilKind, duration: f32) -> Self {
        self.kind = kind;
        self.duration = duration;
        self
    }

    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Trigger volume of the zone.
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// True when status or requirements rule the zone out for bots,
    /// regardless of timing.
    pub fn is_blocked(&self) -> bool {
        if self.status == ZoneStatus::NotPresent {
            return true;
        }
        if self
            .requirements
            .intersects(Requirements::COOPERATION | Requirements::TRAIN)
        {
            return true;
        }
        self.status == ZoneStatus::UncompleteRequirements
            && self.requirements.contains(Requirements::WORLD_EVENT)
    }
}

/// Location where agents enter the map; extraction paths are validated from
/// the nearest one.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpawnMarker {
    pub position: Vec3,
}
