//! Scheduling and public API for the tactical position search.
//!
//! This crate wires the algorithms from `tactics-core` into resumable tasks
//! and exposes them through [`TacticalRuntime`]. The host calls
//! [`TacticalRuntime::tick`] once per frame; every agent's cover finder and
//! the world's extraction scan advance by at most one bounded step.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the façade and its builder
//! - [`api`] exposes the error types downstream clients interact with
//! - [`tasks`] holds the resumable cover and extraction tasks
//! - [`extraction`] assigns extraction points to agents and squads
//! - [`world`] is the registry of agents, squads, zones and spawns
//! - [`visibility`] batches line-of-sight checks over the rayon pool
pub mod agent;
pub mod api;
pub mod extraction;
pub mod runtime;
pub mod tasks;
pub mod visibility;
pub mod world;

pub use agent::AgentCover;
pub use api::{Result, RuntimeError};
pub use extraction::{ExtractionAssignment, ExtractionManager};
pub use runtime::{RuntimeConfig, TacticalRuntime, TacticalRuntimeBuilder, TickReport};
pub use tasks::{CoverFinderTask, CoverTaskContext, ExtractionScanTask, ExtractionTaskContext};
pub use visibility::{SightQuery, batch_line_of_sight};
pub use world::{AgentInfo, Squad, World};
