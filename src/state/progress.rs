use std::fmt;
use std::time::{Duration, Instant};

/// In-memory counters for one phase of a run
///
/// Never persisted: everything needed for resumption lives in the store.
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// New records found (candidate URLs in discovery, remaining URLs in extraction)
    pub discovered: u64,

    /// Records the store already had (snapshot hits and rejected duplicate inserts)
    pub skipped_duplicate: u64,

    /// Categories skipped because their cap was already reached
    pub skipped_exhausted: u64,

    /// Pages fetched successfully
    pub fetched: u64,

    /// Pages that could not be fetched or stored
    pub failed: u64,

    /// Items written to the store
    pub extracted: u64,

    started_at: Instant,
}

impl RunProgress {
    pub fn new() -> Self {
        Self {
            discovered: 0,
            skipped_duplicate: 0,
            skipped_exhausted: 0,
            fetched: 0,
            failed: 0,
            extracted: 0,
            started_at: Instant::now(),
        }
    }

    /// Pages for which a fetch was attempted and answered
    pub fn processed(&self) -> u64 {
        self.fetched + self.failed
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Fetch throughput since the phase started
    pub fn pages_per_sec(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for RunProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "discovered={} fetched={} extracted={} duplicates={} exhausted={} failed={}",
            self.discovered,
            self.fetched,
            self.extracted,
            self.skipped_duplicate,
            self.skipped_exhausted,
            self.failed
        )
    }
}
