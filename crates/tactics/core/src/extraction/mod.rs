//! Extraction search: find and validate a reachable position inside each
//! usable extraction zone, a little at a time.
mod candidate;
mod departure;
mod error;
mod lattice;
mod ordering;
mod resolver;
mod zone;

pub use candidate::{ExtractionCandidate, SpawnAnchor, ZoneStep};
pub use departure::DepartureSchedule;
pub use error::ExtractionError;
pub use lattice::{build_lattice, search_radius};
pub use ordering::anti_cluster_stack;
pub use resolver::ExtractionResolver;
pub use zone::{Audience, ExfilKind, ExtractionZone, Requirements, SpawnMarker, ZoneId, ZoneStatus};
