/// Phase state definitions for the two-phase harvest
///
/// Both phases (URL discovery and item extraction) walk the same small machine:
/// `Init → Running → Done | Halted`.
use std::fmt;

/// Represents the current state of a harvest phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseState {
    // ===== Active States =====
    /// Loading the snapshot from the store
    Init,

    /// Working through categories or URLs
    Running,

    // ===== Terminal States =====
    /// Every unit of work was visited or skipped
    Done,

    /// Stopped early by a rate-limit signal or an interrupt; partial results stand
    Halted,
}

impl PhaseState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Halted)
    }

    /// Returns true if the phase may move from `self` to `next`
    ///
    /// A halt may happen before any work starts (the governor can already be
    /// halted by a previous phase), so `Init → Halted` is allowed.
    pub fn can_transition_to(&self, next: PhaseState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Running)
                | (Self::Init, Self::Halted)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Halted)
        )
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Running => "running",
            Self::Done => "done",
            Self::Halted => "halted",
        };
        write!(f, "{}", name)
    }
}
