//! Cover search: scan nearby geometry, score it against a threat, keep the
//! best candidates in a bounded pool and track the agent's claim.
//!
//! Data flows [`GeometryScanner`] → [`CandidateAnalyzer`] → [`CandidatePool`];
//! [`SpottedTracker`] and [`CoverLifecycle`] act on pooled candidates.
mod analyzer;
mod candidate;
mod lifecycle;
mod pool;
mod scanner;
mod spotted;

pub use analyzer::{CandidateAnalyzer, SearchFrame};
pub use candidate::{CandidateId, CoverCandidate, CoverStatus};
pub use lifecycle::{ClaimError, CoverEvent, CoverLifecycle, CoverState, ResetReason};
pub use pool::{Admission, CandidatePool, DirectionQuery};
pub use scanner::{GeometryScanner, ScanKind};
pub use spotted::{SpottedEntry, SpottedTracker};
