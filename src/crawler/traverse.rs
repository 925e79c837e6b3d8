use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use super::{policy::LinkPolicy, registry::VisitOutcome};
use crate::fetcher::Fetcher;

/// A traversal task's handle onto the outcome stream.
///
/// Each live sink is one outstanding task. Cloning counts a new task before
/// it is spawned and dropping uncounts it, so the channel closes exactly when
/// the last task, root or descendant, has finished.
pub struct OutcomeSink {
    tx: UnboundedSender<VisitOutcome>,
    outstanding: Arc<AtomicUsize>,
}

impl OutcomeSink {
    pub fn new(tx: UnboundedSender<VisitOutcome>) -> Self {
        OutcomeSink {
            tx,
            outstanding: Arc::new(AtomicUsize::new(1)),
        }
    }

    pub fn outstanding(&self) -> Arc<AtomicUsize> {
        self.outstanding.clone()
    }

    fn emit(&self, outcome: VisitOutcome) {
        if let Err(err) = self.tx.send(outcome) {
            tracing::warn!("Outcome dropped, aggregation has stopped: {}", err.0.url);
        }
    }
}

impl Clone for OutcomeSink {
    fn clone(&self) -> Self {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        OutcomeSink {
            tx: self.tx.clone(),
            outstanding: self.outstanding.clone(),
        }
    }
}

impl Drop for OutcomeSink {
    fn drop(&mut self) {
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }
}

pub fn spawn_traversal<F: Fetcher + 'static>(
    fetcher: F,
    policy: LinkPolicy,
    url: String,
    depth: u32,
    sink: OutcomeSink,
) {
    let span = tracing::info_span!("traverse", url = url.as_str(), depth);
    tokio::spawn(
        async move {
            if depth == 0 {
                return;
            }
            match fetcher.fetch(&url).await {
                Ok(page) => {
                    let children = policy.children(&url, page.links);
                    sink.emit(VisitOutcome {
                        url,
                        succeeded: true,
                    });
                    tracing::debug!("Following {} links", children.len());
                    for child in children {
                        spawn_traversal(fetcher.clone(), policy, child, depth - 1, sink.clone());
                    }
                }
                Err(err) => {
                    tracing::warn!("Fetch failed: {}", err);
                    sink.emit(VisitOutcome {
                        url,
                        succeeded: false,
                    });
                }
            }
        }
        .instrument(span),
    );
}
