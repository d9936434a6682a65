//! Crawl scheduler
//!
//! A single-threaded decision loop that owns the worker pool. Each tick it
//! reaps finished workers, enforces the global concurrency ceiling, picks
//! the next stage to advance, pops that stage's queue, and spawns a worker
//! for the item. All I/O happens inside workers; the loop itself only
//! touches queues, the visited set, and bookkeeping.

use crate::config::Config;
use crate::crawler::persist::persistence_worker;
use crate::crawler::queue::{QueueDepths, Queues, VisitedSet};
use crate::crawler::workers::{listing_worker, namespace_worker, page_worker};
use crate::crawler::{CrawlContext, Fetcher};
use crate::faults::FaultLog;
use crate::storage::{open_storage, SharedStore};
use crate::url::{listing_path, Canonicalizer};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Pipeline stages a worker can be dispatched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Namespace,
    Page,
    Persist,
}

/// How long the loop waits when there is nothing to dispatch
const TICK: Duration = Duration::from_millis(50);

/// Cadence of the progress report
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Picks the next stage to advance for a queue-depth snapshot
///
/// Strict priority order: persistence runs whenever work is queued and no
/// persistence worker is active; the discovery stages are throttled so an
/// upstream stage cannot run further than a fixed multiple ahead of its
/// downstream consumer; page fetches soak up everything else.
pub(crate) fn choose_stage(
    depths: &QueueDepths,
    persist_active: bool,
    listing_ratio: usize,
    namespace_ratio: usize,
) -> Option<Stage> {
    if depths.persist > 0 && !persist_active {
        return Some(Stage::Persist);
    }
    if depths.listing > 0 && depths.namespace < listing_ratio.saturating_mul(depths.listing) {
        return Some(Stage::Listing);
    }
    if depths.namespace > 0 && depths.page < namespace_ratio.saturating_mul(depths.namespace) {
        return Some(Stage::Namespace);
    }
    if depths.page > 0 {
        return Some(Stage::Page);
    }
    None
}

/// The crawl control loop
pub struct Scheduler {
    config: Config,
    ctx: Arc<CrawlContext>,
    store: SharedStore,
    persist_active: Arc<AtomicBool>,
}

impl Scheduler {
    /// Creates a scheduler backed by the configured database file
    pub fn new(config: Config) -> crate::Result<Self> {
        let store = open_storage(Path::new(&config.output.database_path))?;
        Self::with_store(config, Arc::new(Mutex::new(store)))
    }

    /// Creates a scheduler over an existing store handle
    pub fn with_store(config: Config, store: SharedStore) -> crate::Result<Self> {
        let ctx = Arc::new(CrawlContext {
            queues: Queues::new(),
            visited: VisitedSet::new(),
            fetcher: Fetcher::new(&config.crawler)?,
            canon: Canonicalizer::from_site(&config.site),
            faults: Arc::new(FaultLog::new()),
        });

        Ok(Self {
            config,
            ctx,
            store,
            persist_active: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The fault sink shared with every worker
    pub fn faults(&self) -> Arc<FaultLog> {
        self.ctx.faults.clone()
    }

    /// Seeds initial work from the persisted store
    ///
    /// Every persisted record marks its canonical URL visited so it is not
    /// crawled twice across runs. Referenced-but-never-crawled articles are
    /// queued first; only a store with no such incomplete work starts
    /// discovery from the listing pages.
    fn seed(&self) -> crate::Result<()> {
        let (pages, dangling) = {
            let store = self.store.lock().unwrap();
            (store.load_pages()?, store.dangling_targets()?)
        };

        for page in &pages {
            let url = self.ctx.canon.canonicalize(&page.article.path());
            self.ctx.visited.insert(url.as_str());
        }
        if !pages.is_empty() {
            tracing::info!("reloaded {} previously crawled pages", pages.len());
        }

        if dangling.is_empty() {
            tracing::info!(
                "no incomplete work found; seeding {} listing pages",
                self.config.crawler.listing_pages
            );
            for page in 1..=self.config.crawler.listing_pages {
                self.ctx
                    .queues
                    .listing
                    .push(self.ctx.canon.canonicalize(&listing_path(page)));
            }
        } else {
            tracing::info!("resuming: enqueueing {} dangling link targets", dangling.len());
            for target in dangling {
                self.ctx
                    .queues
                    .page
                    .push(self.ctx.canon.canonicalize(&target.path()));
            }
        }

        Ok(())
    }

    /// Runs the crawl to completion: all queues drained, all workers done
    pub async fn run(&mut self) -> crate::Result<()> {
        self.seed()?;

        let mut workers: JoinSet<()> = JoinSet::new();
        let mut last_progress = Instant::now();

        loop {
            while let Some(finished) = workers.try_join_next() {
                if let Err(error) = finished {
                    self.ctx
                        .faults
                        .record("scheduler", None, format!("worker task failed: {error}"));
                }
            }

            let depths = self.ctx.queues.depths();
            if depths.total() == 0 && workers.is_empty() {
                break;
            }

            if last_progress.elapsed() >= PROGRESS_INTERVAL {
                tracing::info!(
                    "queues: listing={} namespace={} page={} persist={} | workers {}/{}",
                    depths.listing,
                    depths.namespace,
                    depths.page,
                    depths.persist,
                    workers.len(),
                    self.config.crawler.max_workers
                );
                last_progress = Instant::now();
            }

            if workers.len() >= self.config.crawler.max_workers {
                tokio::time::sleep(TICK).await;
                continue;
            }

            let stage = choose_stage(
                &depths,
                self.persist_active.load(Ordering::Acquire),
                self.config.crawler.listing_ratio,
                self.config.crawler.namespace_ratio,
            );

            match stage {
                Some(Stage::Persist) => {
                    self.persist_active.store(true, Ordering::Release);
                    let ctx = self.ctx.clone();
                    let store = self.store.clone();
                    let active = self.persist_active.clone();
                    let retry_limit = self.config.crawler.persist_retry_limit;
                    workers.spawn(async move {
                        persistence_worker(ctx, store, retry_limit).await;
                        active.store(false, Ordering::Release);
                    });
                }
                Some(Stage::Listing) => {
                    if let Some(url) = self.ctx.queues.listing.pop() {
                        workers.spawn(listing_worker(self.ctx.clone(), url));
                    }
                }
                Some(Stage::Namespace) => {
                    if let Some(url) = self.ctx.queues.namespace.pop() {
                        workers.spawn(namespace_worker(self.ctx.clone(), url));
                    }
                }
                Some(Stage::Page) => {
                    // The sole deduplication point: a URL enters the visited
                    // set at dispatch, and only its first discovery spawns a
                    // worker.
                    while let Some(url) = self.ctx.queues.page.pop() {
                        if self.ctx.visited.insert(url.as_str()) {
                            workers.spawn(page_worker(self.ctx.clone(), url));
                            break;
                        }
                    }
                }
                None => {
                    tokio::time::sleep(TICK).await;
                }
            }
        }

        let (pages, links) = {
            let store = self.store.lock().unwrap();
            (store.count_pages()?, store.count_links()?)
        };
        tracing::info!("crawl complete: {} pages and {} links persisted", pages, links);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, Store};
    use crate::url::ArticleRef;
    use crate::PageRecord;
    use std::collections::HashSet;

    fn depths(listing: usize, namespace: usize, page: usize, persist: usize) -> QueueDepths {
        QueueDepths {
            listing,
            namespace,
            page,
            persist,
        }
    }

    #[test]
    fn test_persistence_has_priority() {
        let snapshot = depths(5, 5, 5, 1);
        assert_eq!(
            choose_stage(&snapshot, false, 100, 10),
            Some(Stage::Persist)
        );
    }

    #[test]
    fn test_single_persistence_worker() {
        let snapshot = depths(0, 0, 5, 3);
        // persistence already running: fall through to page fetches
        assert_eq!(choose_stage(&snapshot, true, 100, 10), Some(Stage::Page));
    }

    #[test]
    fn test_listing_runs_while_under_ratio() {
        let snapshot = depths(2, 199, 0, 0);
        assert_eq!(
            choose_stage(&snapshot, false, 100, 10),
            Some(Stage::Listing)
        );
    }

    #[test]
    fn test_listing_throttled_at_ratio() {
        let snapshot = depths(2, 200, 0, 0);
        // namespace queue is far enough ahead; namespace itself may run
        assert_eq!(
            choose_stage(&snapshot, false, 100, 10),
            Some(Stage::Namespace)
        );
    }

    #[test]
    fn test_namespace_throttled_at_ratio() {
        let snapshot = depths(0, 3, 30, 0);
        assert_eq!(choose_stage(&snapshot, false, 100, 10), Some(Stage::Page));
    }

    #[test]
    fn test_all_empty_yields_none() {
        let snapshot = depths(0, 0, 0, 0);
        assert_eq!(choose_stage(&snapshot, false, 100, 10), None);
        assert_eq!(choose_stage(&snapshot, true, 100, 10), None);
    }

    #[test]
    fn test_throttle_conditions_never_violated() {
        // Property over a grid of snapshots: whatever is chosen respects its
        // own throttle, except the unconditional persistence priority.
        for listing in [0, 1, 3, 40] {
            for namespace in [0, 1, 50, 500] {
                for page in [0, 1, 50, 5000] {
                    for persist in [0, 4] {
                        for active in [false, true] {
                            let snapshot = depths(listing, namespace, page, persist);
                            match choose_stage(&snapshot, active, 100, 10) {
                                Some(Stage::Persist) => {
                                    assert!(persist > 0 && !active);
                                }
                                Some(Stage::Listing) => {
                                    assert!(listing > 0 && namespace < 100 * listing);
                                }
                                Some(Stage::Namespace) => {
                                    assert!(namespace > 0 && page < 10 * namespace);
                                }
                                Some(Stage::Page) => assert!(page > 0),
                                None => {
                                    assert!(persist == 0 || active);
                                    assert!(page == 0);
                                    // discovery queues may be non-empty only
                                    // when their throttles block them
                                    assert!(listing == 0 || namespace >= 100 * listing);
                                    assert!(namespace == 0 || page >= 10 * namespace);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.crawler.listing_pages = 3;
        config
    }

    fn scheduler_with(store: SqliteStore) -> Scheduler {
        Scheduler::with_store(test_config(), Arc::new(Mutex::new(store))).unwrap()
    }

    #[test]
    fn test_seed_fresh_store_starts_discovery() {
        let scheduler = scheduler_with(SqliteStore::new_in_memory().unwrap());
        scheduler.seed().unwrap();

        let depths = scheduler.ctx.queues.depths();
        assert_eq!(depths.listing, 3);
        assert_eq!(depths.page, 0);
        assert!(scheduler.ctx.visited.is_empty());

        let first = scheduler.ctx.queues.listing.pop().unwrap();
        assert_eq!(
            first.as_str(),
            "https://tvtropes.org/pmwiki/articlecount.php?page=1"
        );
    }

    #[test]
    fn test_seed_resumes_dangling_targets_without_discovery() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let crawled = PageRecord {
            article: ArticleRef::new("Main", "Foo"),
            http_status: 200,
            title: None,
            alias_of: None,
        };
        let links: HashSet<_> = [ArticleRef::new("Main", "Bar")].into_iter().collect();
        store.insert_page(&crawled, &links).unwrap();

        let scheduler = scheduler_with(store);
        scheduler.seed().unwrap();

        let depths = scheduler.ctx.queues.depths();
        assert_eq!(depths.listing, 0, "dangling work suppresses discovery");
        assert_eq!(depths.page, 1);

        let queued = scheduler.ctx.queues.page.pop().unwrap();
        assert_eq!(
            queued.as_str(),
            "https://tvtropes.org/pmwiki/pmwiki.php/Main/Bar"
        );

        // the already-persisted page is visited, so it cannot be re-crawled
        assert!(scheduler
            .ctx
            .visited
            .contains("https://tvtropes.org/pmwiki/pmwiki.php/Main/Foo"));
        assert!(!scheduler
            .ctx
            .visited
            .contains("https://tvtropes.org/pmwiki/pmwiki.php/Main/Bar"));
    }
}
