use std::sync::{atomic::Ordering, Mutex, MutexGuard, PoisonError};

use jiff::{SignedDuration, Timestamp};
use thiserror::Error;
use tokio::sync::mpsc;

mod policy;
mod registry;
mod traverse;

pub use policy::LinkPolicy;
pub use registry::CrawlReport;

use registry::Registry;

use crate::fetcher::Fetcher;
use traverse::{spawn_traversal, OutcomeSink};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CrawlError {
    #[error("this crawler is already on the prowl")]
    Busy,
    #[error("depth must be a positive number, got {0}")]
    InvalidDepth(i32),
    #[error("wait for the crawler to finish before generating a report")]
    ReportNotReady,
}

enum CrawlState {
    Idle {
        registry: Registry,
        elapsed: SignedDuration,
    },
    Crawling,
}

impl CrawlState {
    fn empty() -> Self {
        CrawlState::Idle {
            registry: Registry::new(),
            elapsed: SignedDuration::ZERO,
        }
    }
}

/// Puts the engine back to `Idle` however the crawl future ends.
struct CrawlGuard<'a> {
    state: &'a Mutex<CrawlState>,
    finished: Option<(Registry, SignedDuration)>,
}

impl Drop for CrawlGuard<'_> {
    fn drop(&mut self) {
        let next = match self.finished.take() {
            Some((registry, elapsed)) => CrawlState::Idle { registry, elapsed },
            None => CrawlState::empty(),
        };
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// Depth bounded crawler. Every fetched page fans out into one concurrent
/// traversal per followed link, and all visits are tallied by a single
/// aggregation loop.
pub struct Crawler<F: Fetcher + 'static> {
    fetcher: F,
    policy: LinkPolicy,
    state: Mutex<CrawlState>,
}

impl<F: Fetcher + 'static> Crawler<F> {
    pub fn new(fetcher: F, policy: LinkPolicy) -> Self {
        Crawler {
            fetcher,
            policy,
            state: Mutex::new(CrawlState::empty()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CrawlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Crawls from `seed` and returns once every traversal task has finished.
    #[tracing::instrument(skip(self))]
    pub async fn crawl(&self, seed: &str, max_depth: i32) -> Result<CrawlReport, CrawlError> {
        {
            let mut state = self.lock_state();
            if let CrawlState::Crawling = *state {
                return Err(CrawlError::Busy);
            }
            if max_depth <= 0 {
                return Err(CrawlError::InvalidDepth(max_depth));
            }
            *state = CrawlState::Crawling;
        }
        let mut guard = CrawlGuard {
            state: &self.state,
            finished: None,
        };

        tracing::info!("Beginning web crawl");
        let started = Timestamp::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = OutcomeSink::new(tx);
        let outstanding = sink.outstanding();
        spawn_traversal(
            self.fetcher.clone(),
            self.policy,
            seed.to_string(),
            max_depth.unsigned_abs(),
            sink,
        );

        let mut registry = Registry::new();
        let mut visits: u64 = 0;
        while let Some(outcome) = rx.recv().await {
            visits += 1;
            tracing::debug!(
                url = outcome.url.as_str(),
                succeeded = outcome.succeeded,
                visits,
                outstanding = outstanding.load(Ordering::Acquire),
                "Recorded visit"
            );
            registry.record(outcome);
        }

        let elapsed = Timestamp::now().duration_since(started);
        tracing::info!(
            unique_urls = registry.len(),
            visits,
            "Finished crawl in {:#}",
            elapsed
        );
        let report = registry.report(false, elapsed);
        guard.finished = Some((registry, elapsed));
        Ok(report)
    }

    pub fn summary(&self, verbose: bool) -> Result<CrawlReport, CrawlError> {
        match &*self.lock_state() {
            CrawlState::Idle { registry, elapsed } => Ok(registry.report(verbose, *elapsed)),
            CrawlState::Crawling => Err(CrawlError::ReportNotReady),
        }
    }

    /// Text report over the most recently completed crawl.
    pub fn report(&self, verbose: bool) -> Result<String, CrawlError> {
        self.summary(verbose).map(|report| report.to_string())
    }
}
