//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `PhaseState`: the state machine each harvest phase walks through
//! - `RunProgress`: per-phase counters reported in summaries

mod phase_state;
mod progress;

pub use phase_state::PhaseState;
pub use progress::RunProgress;
