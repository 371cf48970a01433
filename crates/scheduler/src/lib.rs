//! Resumable cooperative tasks for frame-budgeted simulation work.
//!
//! Long-running searches (cover scans, extraction validation) must never pay
//! their full cost in a single frame. Instead of language-level generators,
//! each search is an explicit state machine that performs one small unit of
//! work per call and reports how it wants to be resumed.
//!
//! - **Single threaded**: tasks are stepped cooperatively by their owner
//! - **Resumable**: all pending work lives in the task's own fields
//! - **Cancellable**: a cancelled slot never touches its task again
//! - **Zero dependencies**: pure Rust with no external crates
//!
//! # Architecture
//!
//! - [`Task`]: Core trait implemented by every resumable search
//! - [`Step`]: Yield, Sleep, or Stop
//! - [`TaskSlot`]: Owns a task and enforces sleeps and cancellation

pub mod slot;
pub mod step;
pub mod task;

// Re-export core types for ergonomic API
pub use slot::{SlotState, TaskSlot};
pub use step::Step;
pub use task::Task;
