//! Result returned by a task after one unit of work.

/// How a task wants to be resumed after a call to [`crate::Task::step`].
///
/// # Frame-budget Semantics
///
/// A task never loops internally over unbounded work. It does one unit
/// (e.g., recheck one candidate) and hands control back:
/// - `Yield`: more work is pending in the current pass, resume next tick
/// - `Sleep`: the pass is complete, resume after the given number of seconds
/// - `Stop`: the task is finished for good
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// More work is pending; resume on the next tick.
    Yield,

    /// The current pass completed; resume after `seconds` of simulated time.
    Sleep(f32),

    /// The task has nothing left to do and must not be stepped again.
    Stop,
}

impl Step {
    /// Returns `true` if this step asks to be resumed next tick.
    #[inline]
    pub fn is_yield(self) -> bool {
        matches!(self, Step::Yield)
    }

    /// Returns `true` if this step ends the task.
    #[inline]
    pub fn is_stop(self) -> bool {
        matches!(self, Step::Stop)
    }

    /// Returns the requested sleep duration, if any.
    #[inline]
    pub fn sleep_seconds(self) -> Option<f32> {
        match self {
            Step::Sleep(seconds) => Some(seconds),
            _ => None,
        }
    }
}
