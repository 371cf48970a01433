//! Core task trait.
//!
//! This module defines the [`Task`] trait, the fundamental abstraction for
//! resumable work. The trait is generic over a context type `C`, so a task
//! can read the world snapshot of the current tick without owning it.

use crate::Step;

/// A resumable unit of cooperative work.
pub trait Task<C> {
    /// Perform one bounded unit of work against the given context.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Mutable reference to the per-tick context. Tasks keep their
    ///   own progress in `self`; the context only carries what the current
    ///   tick can see.
    ///
    /// # Returns
    ///
    /// - `Step::Yield` if more work is pending in this pass
    /// - `Step::Sleep(secs)` if the pass completed
    /// - `Step::Stop` if the task is done
    fn step(&mut self, ctx: &mut C) -> Step;
}

/// Blanket implementation for boxed tasks.
///
/// This allows `Box<dyn Task<C>>` to also implement `Task<C>`, enabling
/// dynamic dispatch and heterogeneous collections of tasks.
impl<C> Task<C> for Box<dyn Task<C>> {
    #[inline]
    fn step(&mut self, ctx: &mut C) -> Step {
        (**self).step(ctx)
    }
}
