//! Reachability gate shared by the cover and extraction searches.
use glam::Vec3;

use crate::env::NavMesh;

/// Returns true if a complete, unbroken navigable path joins `start` and `end`.
///
/// Nothing is cached: the navigation mesh can change between ticks (doors,
/// obstacles) and each caller decides when to ask again.
pub fn complete_path_exists(nav: &dyn NavMesh, start: Vec3, end: Vec3) -> bool {
    let exists = nav.path_exists(start, end);
    tracing::trace!(?start, ?end, exists, "path validation");
    exists
}

/// Length of the complete path joining `start` and `end`, if any.
pub fn complete_path_length(nav: &dyn NavMesh, start: Vec3, end: Vec3) -> Option<f32> {
    let length = nav.path_length(start, end);
    tracing::trace!(?start, ?end, ?length, "path length");
    length
}
