//! Traits describing the host engine services the searches depend on.
//!
//! The navigation mesh, the static-geometry overlap query and the sight
//! raycaster are owned by the host. [`SpatialEnv`] bundles borrowed handles
//! to all three so searches can reach everything they need without coupling
//! to concrete implementations.
mod geometry;
mod nav;
mod sight;

pub use geometry::{GeometryQuery, MAX_OVERLAP_HITS, OverlapBuffer};
pub use nav::NavMesh;
pub use sight::SightOracle;

/// Aggregates the read-only services required by the cover and extraction
/// searches for one tick.
#[derive(Clone, Copy)]
pub struct SpatialEnv<'a> {
    nav: &'a dyn NavMesh,
    geometry: &'a dyn GeometryQuery,
    sight: &'a dyn SightOracle,
}

impl<'a> SpatialEnv<'a> {
    pub fn new(
        nav: &'a dyn NavMesh,
        geometry: &'a dyn GeometryQuery,
        sight: &'a dyn SightOracle,
    ) -> Self {
        Self {
            nav,
            geometry,
            sight,
        }
    }

    pub fn nav(&self) -> &'a dyn NavMesh {
        self.nav
    }

    pub fn geometry(&self) -> &'a dyn GeometryQuery {
        self.geometry
    }

    pub fn sight(&self) -> &'a dyn SightOracle {
        self.sight
    }
}

impl std::fmt::Debug for SpatialEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialEnv").finish_non_exhaustive()
    }
}
