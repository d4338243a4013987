//! Status returned by behavior nodes.

/// The result of ticking a behavior node.
///
/// `Running` is what makes multi-tick behaviors possible: an action that
/// spans several simulation steps (walking to a nav target, waiting out a
/// telegraph) reports `Running` and is resumed at the same spot next tick
/// via composite cursor memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The behavior completed successfully this tick.
    Success,

    /// The behavior failed. Handled locally by selector fallbacks,
    /// never fatal.
    Failure,

    /// The behavior is still in progress and wants to be resumed
    /// on the next tick.
    Running,
}

impl Status {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }

    #[inline]
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure)
    }

    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Status::Running)
    }

    /// Inverts Success/Failure. Running passes through unchanged —
    /// an in-progress child is in progress no matter how it is wrapped.
    #[inline]
    pub fn invert(self) -> Self {
        match self {
            Status::Success => Status::Failure,
            Status::Failure => Status::Success,
            Status::Running => Status::Running,
        }
    }
}
