//! Output module for harvest summaries
//!
//! This module handles:
//! - Printing the summary every phase ends with
//! - Loading and printing store-wide statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};

use crate::crawler::{HaltReason, Phase, PhaseOutcome, PhaseReport};

/// One-line description of how a phase ended
pub fn outcome_label(outcome: &PhaseOutcome) -> &'static str {
    match outcome {
        PhaseOutcome::Done => "done",
        PhaseOutcome::Halted(HaltReason::RateLimited) => "halted (rate limited)",
        PhaseOutcome::Halted(HaltReason::Interrupted) => "halted (interrupted)",
    }
}

/// Prints the end-of-phase summary to stdout
pub fn print_phase_report(report: &PhaseReport) {
    let progress = &report.progress;

    println!("=== {} summary ===", report.phase);
    println!("  Outcome: {}", outcome_label(&report.outcome));
    println!("  Duration: {:.1}s", progress.elapsed().as_secs_f64());
    println!("  Pages fetched: {}", progress.fetched);
    println!("  Failed: {}", progress.failed);
    match report.phase {
        Phase::Discovery => println!("  New candidate URLs: {}", progress.discovered),
        Phase::Extraction => {
            println!("  Queued URLs: {}", progress.discovered);
            println!("  Items extracted: {}", progress.extracted);
        }
    }
    println!("  Skipped (already stored): {}", progress.skipped_duplicate);
    if progress.skipped_exhausted > 0 {
        println!("  Skipped (exhausted categories): {}", progress.skipped_exhausted);
    }
    println!();
}
