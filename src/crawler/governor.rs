//! Rate governor shared by every fetch worker
//!
//! This module handles:
//! - Spacing requests by a base delay with random jitter
//! - Adapting the delay to observed response latency (autothrottle)
//! - Halting the run for good on a rate-limit signal or an interrupt

use crate::config::CrawlerConfig;
use rand::Rng;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const NOT_HALTED: u8 = 0;
const HALTED_RATE_LIMITED: u8 = 1;
const HALTED_INTERRUPTED: u8 = 2;

/// Why the governor stopped issuing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The site answered HTTP 429
    RateLimited,
    /// The user asked the process to stop
    Interrupted,
}

/// Mutable pacing state, guarded by the governor's mutex
#[derive(Debug)]
struct Pacing {
    /// Current delay before jitter
    delay: Duration,

    /// Earliest instant the next request may start
    next_slot: Option<Instant>,
}

/// Rate governor for a single run
///
/// Safe to share between concurrent workers behind an `Arc`: the halt flag is an
/// atomic and the pacing state sits behind a mutex.
#[derive(Debug)]
pub struct RateGovernor {
    start_delay: Duration,
    max_delay: Duration,
    jitter: bool,
    adaptive: bool,
    concurrency: f64,
    halted: AtomicU8,
    pacing: Mutex<Pacing>,
}

impl RateGovernor {
    /// Creates a governor from the crawler configuration
    pub fn new(config: &CrawlerConfig) -> Self {
        let start_delay = Duration::from_millis(config.base_delay_ms);
        Self {
            start_delay,
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
            adaptive: config.adaptive,
            concurrency: config.concurrency.max(1) as f64,
            halted: AtomicU8::new(NOT_HALTED),
            pacing: Mutex::new(Pacing {
                delay: start_delay,
                next_slot: None,
            }),
        }
    }

    /// Returns false once the governor has halted; stays false for the rest of the run
    pub fn should_proceed(&self) -> bool {
        self.halted.load(Ordering::SeqCst) == NOT_HALTED
    }

    /// Returns the reason for the halt, if halted
    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.halted.load(Ordering::SeqCst) {
            HALTED_RATE_LIMITED => Some(HaltReason::RateLimited),
            HALTED_INTERRUPTED => Some(HaltReason::Interrupted),
            _ => None,
        }
    }

    /// Halts the governor; the first reason recorded wins
    pub fn halt(&self, reason: HaltReason) {
        let code = match reason {
            HaltReason::RateLimited => HALTED_RATE_LIMITED,
            HaltReason::Interrupted => HALTED_INTERRUPTED,
        };
        let _ = self
            .halted
            .compare_exchange(NOT_HALTED, code, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Records the outcome of a request
    ///
    /// A 429 halts the governor. Otherwise, in adaptive mode, the latency proposes a
    /// target delay of `latency / concurrency`; the new delay is the mean of the
    /// current delay and the target (never below the target), clamped to
    /// `[start_delay, max_delay]`. Non-success responses are not allowed to lower it.
    pub fn record_response(&self, status: u16, latency: Duration) {
        if status == 429 {
            tracing::warn!("Rate limit signal (HTTP 429) received, halting");
            self.halt(HaltReason::RateLimited);
            return;
        }

        if !self.adaptive {
            return;
        }

        let mut pacing = self.lock_pacing();
        let target = latency.div_f64(self.concurrency);
        let proposed = ((pacing.delay + target) / 2)
            .max(target)
            .clamp(self.start_delay, self.max_delay);

        let success = (200..300).contains(&status);
        if !success && proposed < pacing.delay {
            return;
        }

        if proposed != pacing.delay {
            tracing::trace!(
                "Adaptive delay {:?} -> {:?} (latency {:?}, status {})",
                pacing.delay,
                proposed,
                latency,
                status
            );
        }
        pacing.delay = proposed;
    }

    /// Returns the delay to apply before the next request, jitter included
    pub fn delay_before_next(&self) -> Duration {
        let base = self.current_delay();
        if self.jitter {
            base.mul_f64(rand::thread_rng().gen_range(0.5..=1.5))
        } else {
            base
        }
    }

    /// Current delay before jitter
    pub fn current_delay(&self) -> Duration {
        self.lock_pacing().delay
    }

    /// Waits until this caller's reserved request slot
    ///
    /// Slots are handed out in call order and spaced by `delay_before_next()`, so
    /// concurrent workers never start requests closer together than the delay.
    pub async fn wait_turn(&self) {
        let slot = self.reserve_slot(Instant::now());
        let now = Instant::now();
        if slot > now {
            tokio::time::sleep(slot - now).await;
        }
    }

    /// Reserves the next slot and returns the instant it starts
    fn reserve_slot(&self, now: Instant) -> Instant {
        let gap = self.delay_before_next();
        let mut pacing = self.lock_pacing();
        let slot = match pacing.next_slot {
            Some(next) if next > now => next,
            _ => now,
        };
        pacing.next_slot = Some(slot + gap);
        slot
    }

    fn lock_pacing(&self) -> std::sync::MutexGuard<'_, Pacing> {
        // A poisoned lock only means another worker panicked mid-update; the
        // pacing values are still usable
        self.pacing.lock().unwrap_or_else(|e| e.into_inner())
    }
}
