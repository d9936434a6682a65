//! Crawler module: the four-stage pipeline and its scheduler
//!
//! Work flows strictly downstream through the stage queues: listing
//! discovery seeds namespace discovery, namespace pages yield article URLs,
//! page workers produce persistence tasks, and one persistence worker
//! commits them. Page workers also feed their own queue with newly
//! discovered links and alias targets.

mod extract;
mod fetcher;
mod persist;
mod queue;
mod scheduler;
mod workers;

pub use fetcher::{build_http_client, Backoff, Fetcher};
pub use persist::PersistTask;
pub use queue::{QueueDepths, Queues, VisitedSet, WorkQueue};
pub use scheduler::{Scheduler, Stage};
pub use workers::MAX_REDIRECT_HOPS;

use crate::config::Config;
use crate::faults::FaultLog;
use crate::url::Canonicalizer;
use std::path::Path;
use std::sync::Arc;

/// Shared state every worker runs against
///
/// The queues are the only inter-stage channel; the visited set is the only
/// correctness-critical shared structure.
pub(crate) struct CrawlContext {
    pub queues: Queues,
    pub visited: VisitedSet,
    pub fetcher: Fetcher,
    pub canon: Canonicalizer,
    pub faults: Arc<FaultLog>,
}

/// Runs a complete crawl
///
/// Seeds from the persisted store, runs the scheduler loop to natural
/// completion, and flushes the fault log. An external interrupt (Ctrl-C)
/// stops the run between ticks and still flushes the fault log before
/// returning; whatever reached the store stays, and the next run resumes
/// from it.
pub async fn run_crawl(config: Config) -> crate::Result<()> {
    let fault_log_path = config.output.fault_log_path.clone();
    let mut scheduler = Scheduler::new(config)?;
    let faults = scheduler.faults();

    let result = tokio::select! {
        result = scheduler.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, stopping with work in flight");
            Ok(())
        }
    };

    if !faults.is_empty() {
        let path = Path::new(&fault_log_path);
        tracing::warn!("{} faults recorded, writing {}", faults.len(), path.display());
        faults.flush_to(path)?;
    }

    result
}
