//! Run coordinator - phase orchestration logic
//!
//! This module drives the two resumable phases of a harvest:
//! - Phase A (discovery): index page -> category pages -> candidate URLs
//! - Phase B (extraction): remaining candidates -> extracted items
//!
//! Only fetching runs concurrently. Parsing, frontier updates and store writes happen
//! here, on the coordinator task, in completion order.

use crate::config::Config;
use crate::crawler::extractor::{extract_best_effort, DiscoveryContext, UNKNOWN};
use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::crawler::governor::{HaltReason, RateGovernor};
use crate::frontier::{remaining_work, CategoryRef, Frontier, ItemDiscovery, RunSnapshot};
use crate::state::{PhaseState, RunProgress};
use crate::storage::{open_storage, CandidateUrl, InsertOutcome, SqliteStorage, Storage};
use crate::HarvestError;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// The two phases of a harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Extraction,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Discovery => write!(f, "URL discovery"),
            Phase::Extraction => write!(f, "item extraction"),
        }
    }
}

/// How a phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Every unit of work was visited or skipped
    Done,
    /// The governor stopped the phase early; everything stored so far is kept
    Halted(HaltReason),
}

impl PhaseOutcome {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted(_))
    }
}

/// Summary of a finished phase
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: Phase,
    pub outcome: PhaseOutcome,
    pub progress: RunProgress,
}

/// Tracks a phase through its state machine
#[derive(Debug)]
struct PhaseTracker {
    phase: Phase,
    state: PhaseState,
}

impl PhaseTracker {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            state: PhaseState::Init,
        }
    }

    fn advance(&mut self, next: PhaseState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("{}: {} -> {}", self.phase, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Moves to the terminal state matching the outcome and builds the report
    fn finish(
        mut self,
        outcome: PhaseOutcome,
        progress: RunProgress,
    ) -> Result<PhaseReport, HarvestError> {
        let terminal = match outcome {
            PhaseOutcome::Done => PhaseState::Done,
            PhaseOutcome::Halted(_) => PhaseState::Halted,
        };
        self.advance(terminal)?;

        match outcome {
            PhaseOutcome::Done => tracing::info!("{} complete: {}", self.phase, progress),
            PhaseOutcome::Halted(reason) => {
                tracing::warn!("{} halted ({:?}): {}", self.phase, reason, progress)
            }
        }

        Ok(PhaseReport {
            phase: self.phase,
            outcome,
            progress,
        })
    }
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    fetcher: PageFetcher,
    governor: Arc<RateGovernor>,
}

impl Coordinator {
    /// Creates a coordinator, opening the configured store
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Store opened and HTTP client built
    /// * `Err(HarvestError)` - The store is unreachable or the client failed to build
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let storage = open_storage(&config.store)?;
        Self::with_storage(config, storage)
    }

    /// Creates a coordinator over an already opened store
    pub fn with_storage(config: Config, storage: SqliteStorage) -> Result<Self, HarvestError> {
        let governor = Arc::new(RateGovernor::new(&config.crawler));
        let fetcher = PageFetcher::new(&config.crawler, &config.identity, Arc::clone(&governor))?;

        Ok(Self {
            config,
            storage,
            fetcher,
            governor,
        })
    }

    /// Handle to the shared governor, for interrupt handling
    pub fn governor(&self) -> Arc<RateGovernor> {
        Arc::clone(&self.governor)
    }

    /// The underlying store
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs Phase A: collects candidate URLs from every non-exhausted category
    ///
    /// With `fresh` set, stored URLs and exhaustion markers are ignored for skipping;
    /// the store still drops duplicates.
    ///
    /// # Returns
    ///
    /// * `Ok(PhaseReport)` - The phase finished or halted
    /// * `Err(HarvestError)` - The index page could not be fetched, or the store failed
    ///   to load its snapshot
    pub async fn discover_urls(&mut self, fresh: bool) -> Result<PhaseReport, HarvestError> {
        let mut tracker = PhaseTracker::new(Phase::Discovery);
        let mut progress = RunProgress::new();

        let snapshot = RunSnapshot::load(&self.storage)?;
        tracing::info!(
            "Loaded snapshot: {} known URLs across {} categories",
            snapshot.known_urls.len(),
            snapshot.category_counts.len()
        );
        let mut frontier = Frontier::new(
            snapshot,
            &self.config.site,
            self.config.crawler.per_category_cap,
            fresh,
        )?;

        if let Some(reason) = self.governor.halt_reason() {
            return tracker.finish(PhaseOutcome::Halted(reason), progress);
        }
        tracker.advance(PhaseState::Running)?;

        let index_url = frontier.index_url().to_string();
        tracing::info!("Fetching category index {}", index_url);
        let index_page = match self.fetcher.fetch(&index_url).await {
            Ok(page) => page,
            Err(e) if e.is_rate_limited() => {
                let reason = self.halt_reason();
                return tracker.finish(PhaseOutcome::Halted(reason), progress);
            }
            Err(e) => {
                return Err(HarvestError::IndexUnavailable {
                    url: index_url,
                    reason: e.to_string(),
                })
            }
        };

        let categories = frontier.discover_categories(&index_page.body);
        progress.skipped_exhausted = categories.exhausted.len() as u64;
        for category in &categories.exhausted {
            tracing::debug!("Skipping exhausted category {}", category.name);
        }
        tracing::info!(
            "Found {} categories ({} to visit, {} exhausted)",
            categories.to_visit.len() + categories.exhausted.len(),
            categories.to_visit.len(),
            categories.exhausted.len()
        );

        let total = categories.to_visit.len();
        let fetcher = self.fetcher.clone();
        let mut pages = stream::iter(categories.to_visit)
            .map(|category| {
                let fetcher = fetcher.clone();
                async move {
                    let result = fetcher.fetch(category.url.as_str()).await;
                    (category, result)
                }
            })
            .buffer_unordered(self.concurrency());

        while let Some((category, result)) = pages.next().await {
            match result {
                Ok(page) => {
                    progress.fetched += 1;
                    let discovery = frontier.discover_items(&page.body, &category);
                    self.record_candidates(&category, discovery, &mut progress);
                }
                Err(e) => self.record_failure(&e, &mut progress),
            }

            self.log_progress(&progress, total);
            if !self.governor.should_proceed() {
                break;
            }
        }

        let outcome = self.outcome();
        tracker.finish(outcome, progress)
    }

    /// Runs Phase B: extracts every candidate that has no item yet
    pub async fn extract_items(&mut self) -> Result<PhaseReport, HarvestError> {
        let mut tracker = PhaseTracker::new(Phase::Extraction);
        let mut progress = RunProgress::new();

        let remaining = remaining_work(&self.storage)?;
        progress.discovered = remaining.len() as u64;
        tracing::info!(
            "{} of {} candidate URLs remain to extract",
            remaining.len(),
            self.storage.count_urls()?
        );

        if let Some(reason) = self.governor.halt_reason() {
            return tracker.finish(PhaseOutcome::Halted(reason), progress);
        }
        tracker.advance(PhaseState::Running)?;

        let total = remaining.len();
        let fetcher = self.fetcher.clone();
        let mut pages = stream::iter(remaining)
            .map(|candidate| {
                let fetcher = fetcher.clone();
                async move {
                    let result = fetcher.fetch(&candidate.url).await;
                    (candidate, result)
                }
            })
            .buffer_unordered(self.concurrency());

        while let Some((candidate, result)) = pages.next().await {
            match result {
                Ok(page) => {
                    progress.fetched += 1;
                    self.record_item(&candidate, &page, &mut progress);
                }
                Err(e) => self.record_failure(&e, &mut progress),
            }

            self.log_progress(&progress, total);
            if !self.governor.should_proceed() {
                break;
            }
        }

        let outcome = self.outcome();
        tracker.finish(outcome, progress)
    }

    /// Runs Phase A then Phase B
    ///
    /// Phase B is skipped when Phase A halted.
    pub async fn run_all(&mut self, fresh: bool) -> Result<Vec<PhaseReport>, HarvestError> {
        let discovery = self.discover_urls(fresh).await?;
        let halted = discovery.outcome.is_halted();
        let mut reports = vec![discovery];

        if halted {
            tracing::warn!("Skipping item extraction because URL discovery halted");
        } else {
            reports.push(self.extract_items().await?);
        }

        Ok(reports)
    }

    fn record_candidates(
        &mut self,
        category: &CategoryRef,
        discovery: ItemDiscovery,
        progress: &mut RunProgress,
    ) {
        tracing::debug!(
            "Category {} ({}): {} item links, {} over cap, {} already known, {} new",
            discovery.category,
            category.url,
            discovery.found,
            discovery.over_cap,
            discovery.already_known,
            discovery.candidates.len()
        );
        progress.skipped_duplicate += discovery.already_known as u64;

        for candidate in &discovery.candidates {
            match self.storage.insert_url(candidate) {
                Ok(InsertOutcome::Inserted) => progress.discovered += 1,
                Ok(InsertOutcome::Duplicate) => {
                    tracing::debug!("Duplicate candidate {}", candidate.url);
                    progress.skipped_duplicate += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to store candidate {}: {}", candidate.url, e);
                    progress.failed += 1;
                }
            }
        }
    }

    fn record_item(
        &mut self,
        candidate: &CandidateUrl,
        page: &FetchedPage,
        progress: &mut RunProgress,
    ) {
        let category = Some(candidate.category.as_str()).filter(|c| *c != UNKNOWN);
        let context = DiscoveryContext::new(&candidate.url, category);
        let item = extract_best_effort(&page.body, &context);

        match self.storage.insert_item(&item) {
            Ok(InsertOutcome::Inserted) => {
                tracing::debug!("Extracted {} ({} accords)", item.name, item.attributes.len());
                progress.extracted += 1;
            }
            Ok(InsertOutcome::Duplicate) => {
                tracing::debug!("Duplicate item {}", item.url);
                progress.skipped_duplicate += 1;
            }
            Err(e) => {
                tracing::error!("Failed to store item {}: {}", item.url, e);
                progress.failed += 1;
            }
        }
    }

    fn record_failure(&self, error: &FetchError, progress: &mut RunProgress) {
        if error.is_rate_limited() {
            // Not a failure: the page stays pending for the next run
            tracing::debug!("{}", error);
            return;
        }
        tracing::warn!("{}", error);
        progress.failed += 1;
    }

    fn log_progress(&self, progress: &RunProgress, total: usize) {
        let interval = self.config.crawler.progress_interval;
        let processed = progress.processed();
        if interval == 0 || processed == 0 || processed % interval != 0 {
            return;
        }

        tracing::info!(
            "Progress: {}/{} pages, {} ({:.2} pages/sec, delay {:?})",
            processed,
            total,
            progress,
            progress.pages_per_sec(),
            self.governor.current_delay()
        );
    }

    fn concurrency(&self) -> usize {
        self.config.crawler.concurrency.max(1) as usize
    }

    fn halt_reason(&self) -> HaltReason {
        self.governor
            .halt_reason()
            .unwrap_or(HaltReason::RateLimited)
    }

    fn outcome(&self) -> PhaseOutcome {
        match self.governor.halt_reason() {
            Some(reason) => PhaseOutcome::Halted(reason),
            None => PhaseOutcome::Done,
        }
    }
}
