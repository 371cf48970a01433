//! Ownership wrapper that enforces sleeps and cancellation.
//!
//! A [`TaskSlot`] is the only thing allowed to call [`Task::step`]. It keeps
//! the simulated time at which the task may run again and a terminal state
//! so that a cancelled or stopped task is never resumed.

use crate::{Step, Task};

/// Lifecycle of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotState {
    /// The task may be stepped once its wake time has passed.
    Active,

    /// The task returned [`Step::Stop`].
    Stopped,

    /// The owner cancelled the task. It will never be stepped again.
    Cancelled,
}

/// Owns a task together with its scheduling bookkeeping.
#[derive(Debug)]
pub struct TaskSlot<T> {
    task: T,
    state: SlotState,
    wake_at: f32,
}

impl<T> TaskSlot<T> {
    /// Wraps a task that is ready to run immediately.
    pub fn new(task: T) -> Self {
        Self {
            task,
            state: SlotState::Active,
            wake_at: f32::NEG_INFINITY,
        }
    }

    /// Steps the task once if it is active and awake.
    ///
    /// Returns the step reported by the task, or `None` if the slot was not
    /// eligible to run at `now` (sleeping, stopped or cancelled).
    pub fn poll<C>(&mut self, ctx: &mut C, now: f32) -> Option<Step>
    where
        T: Task<C>,
    {
        if self.state != SlotState::Active || now < self.wake_at {
            return None;
        }

        let step = self.task.step(ctx);
        match step {
            Step::Yield => self.wake_at = now,
            Step::Sleep(seconds) => self.wake_at = now + seconds.max(0.0),
            Step::Stop => self.state = SlotState::Stopped,
        }
        Some(step)
    }

    /// Permanently stops the task. Later polls are no-ops.
    pub fn cancel(&mut self) {
        self.state = SlotState::Cancelled;
    }

    /// Clears any pending sleep so the next poll runs the task.
    pub fn wake(&mut self) {
        self.wake_at = f32::NEG_INFINITY;
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SlotState {
        self.state
    }

    /// Returns `true` if the task can still be stepped at some point.
    pub fn is_active(&self) -> bool {
        self.state == SlotState::Active
    }

    /// Returns `true` if the task is active but waiting until a later time.
    pub fn is_sleeping(&self, now: f32) -> bool {
        self.is_active() && now < self.wake_at
    }

    /// Shared access to the wrapped task.
    pub fn task(&self) -> &T {
        &self.task
    }

    /// Mutable access to the wrapped task.
    ///
    /// Callers use this to read or adjust task-owned data between ticks;
    /// stepping must still go through [`TaskSlot::poll`].
    pub fn task_mut(&mut self) -> &mut T {
        &mut self.task
    }
}
