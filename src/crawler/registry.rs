use std::{
    collections::HashMap,
    fmt::{Display, Formatter, Result},
};

use jiff::SignedDuration;

/// The result of one traversal task's fetch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitOutcome {
    pub url: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlRecord {
    pub url: String,
    pub ever_succeeded: bool,
    pub visit_count: u64,
}

/// Per-URL visit state for a single crawl run.
///
/// Only the aggregation loop writes to it, so it needs no locking of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry(HashMap<String, UrlRecord>);

impl Registry {
    pub fn new() -> Self {
        Registry(HashMap::new())
    }

    pub fn record(&mut self, outcome: VisitOutcome) {
        match self.0.get_mut(&outcome.url) {
            Some(record) => {
                record.visit_count += 1;
                // success is sticky: a later failed refetch keeps the history
                record.ever_succeeded |= outcome.succeeded;
            }
            None => {
                self.0.insert(
                    outcome.url.clone(),
                    UrlRecord {
                        url: outcome.url,
                        ever_succeeded: outcome.succeeded,
                        visit_count: 1,
                    },
                );
            }
        };
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn total_visits(&self) -> u64 {
        self.0.values().map(|record| record.visit_count).sum()
    }

    pub fn report(&self, verbose: bool, elapsed: SignedDuration) -> CrawlReport {
        let mut details = vec![];
        if verbose {
            details = self.0.values().cloned().collect::<Vec<_>>();
            details.sort_by(|a, b| a.url.cmp(&b.url));
        }
        CrawlReport {
            unique_urls: self.0.len(),
            dead_links: self.0.values().filter(|r| !r.ever_succeeded).count(),
            revisited: self.0.values().filter(|r| r.visit_count > 1).count(),
            total_visits: self.total_visits(),
            elapsed,
            details,
        }
    }
}

/// Read-only summary of a finished crawl.
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub unique_urls: usize,
    pub dead_links: usize,
    pub revisited: usize,
    pub total_visits: u64,
    pub elapsed: SignedDuration,
    /// Ordered by URL; empty unless the report was requested verbose.
    pub details: Vec<UrlRecord>,
}

impl Display for CrawlReport {
    fn fmt(&self, f: &mut Formatter) -> Result {
        writeln!(f, "Unique URLs visited: {}", self.unique_urls)?;
        writeln!(f, "Unable to retrieve (#URLs): {}", self.dead_links)?;
        writeln!(f, "URLs visited more than once: {}", self.revisited)?;
        writeln!(f, "Crawl time: {:#}", self.elapsed)?;
        for record in &self.details {
            writeln!(
                f,
                "URL: {} Visited: {} Successfully Retrieved: {}",
                record.url, record.visit_count, record.ever_succeeded
            )?;
        }
        Ok(())
    }
}
