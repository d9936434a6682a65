//! Persistence worker
//!
//! Drains the persistence queue and commits each page record together with
//! its link set in one transaction. The scheduler never runs more than one
//! persistence worker at a time, so the store needs no locking beyond the
//! shared handle. A failed transaction is rolled back and the task is
//! re-queued, up to a retry cap; at-least-once, not exactly-once.

use crate::crawler::CrawlContext;
use crate::storage::{PageRecord, SharedStore};
use crate::url::ArticleRef;
use std::collections::HashSet;
use std::sync::Arc;

/// One pending persistence unit: a page record and the link set attributed
/// to it
#[derive(Debug, Clone)]
pub struct PersistTask {
    pub record: PageRecord,
    pub links: HashSet<ArticleRef>,
    /// How many times this task has already failed to commit
    pub attempts: u32,
}

impl PersistTask {
    pub fn new(record: PageRecord, links: HashSet<ArticleRef>) -> Self {
        Self {
            record,
            links,
            attempts: 0,
        }
    }

    /// Reconstructs the task for another attempt, links reattached
    fn retry(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            ..self
        }
    }
}

/// Drains the persistence queue until it is empty
pub(crate) async fn persistence_worker(ctx: Arc<CrawlContext>, store: SharedStore, retry_limit: u32) {
    while let Some(task) = ctx.queues.persist.pop() {
        let result = {
            let mut store = store.lock().unwrap();
            store.insert_page(&task.record, &task.links)
        };

        if let Err(error) = result {
            let article = task.record.article.to_string();
            if task.attempts < retry_limit {
                ctx.faults.record(
                    "persist",
                    Some(article.as_str()),
                    format!("commit failed (attempt {}): {}", task.attempts + 1, error),
                );
                ctx.queues.persist.push(task.retry());
            } else {
                ctx.faults.record(
                    "persist",
                    Some(article.as_str()),
                    format!("dropped after {} failed attempts: {}", task.attempts + 1, error),
                );
            }
        }
    }
}
