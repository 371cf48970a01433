//! Deterministic tactical position search shared by the runtime.
//!
//! `tactics-core` owns the data types and the per-step algorithms for two
//! searches: cover points that hide an agent from a threat, and reachable
//! positions inside extraction zones. Everything here is synchronous and does
//! a bounded amount of work per call; the runtime decides when to call.
//! Host services (navigation mesh, static geometry, line of sight) are
//! consumed through the traits in [`env`].
pub mod config;
pub mod cover;
pub mod env;
pub mod error;
pub mod events;
pub mod extraction;
pub mod geometry;
pub mod path;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigError, CoverConfig, ExtractionConfig, SearchConfig};
pub use cover::{
    Admission, CandidateAnalyzer, CandidateId, CandidatePool, ClaimError, CoverCandidate,
    CoverEvent, CoverLifecycle, CoverState, CoverStatus, DirectionQuery, GeometryScanner,
    ScanKind, SearchFrame, SpottedEntry, SpottedTracker,
};
pub use env::{GeometryQuery, NavMesh, OverlapBuffer, SightOracle, SpatialEnv};
pub use error::{ErrorSeverity, TacticalError};
pub use events::{Observers, SubscriptionId};
pub use extraction::{
    Audience, DepartureSchedule, ExfilKind, ExtractionCandidate, ExtractionError,
    ExtractionResolver, ExtractionZone, Requirements, SpawnMarker, ZoneId, ZoneStatus, ZoneStep,
};
pub use geometry::{Bounds, Geometry, GeometryId};
pub use path::{complete_path_exists, complete_path_length};
pub use types::{AgentId, CombatDecision, Faction, SimTime, SquadId};
