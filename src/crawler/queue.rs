//! Concurrent work queues and the visited set
//!
//! The four stage queues are the only channel between pipeline stages; any
//! worker may push to any queue, while popping is done by the scheduler when
//! it dispatches a worker for that stage. The visited set is the single
//! deduplication point for page fetches.

use crate::crawler::persist::PersistTask;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use url::Url;

/// Multi-producer FIFO queue of pending work items
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: T) {
        self.items.lock().unwrap().push_back(item);
    }

    pub fn pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Concurrency-safe set of canonical URLs that have been dispatched
///
/// Insertion is atomic add-if-absent: of any number of concurrent inserts of
/// the same URL, exactly one observes `true`.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the URL if absent; returns whether it was newly added
    pub fn insert(&self, url: &str) -> bool {
        self.urls.lock().unwrap().insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.lock().unwrap().contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four stage queues
#[derive(Debug, Default)]
pub struct Queues {
    pub listing: WorkQueue<Url>,
    pub namespace: WorkQueue<Url>,
    pub page: WorkQueue<Url>,
    pub persist: WorkQueue<PersistTask>,
}

impl Queues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depths(&self) -> QueueDepths {
        QueueDepths {
            listing: self.listing.len(),
            namespace: self.namespace.len(),
            page: self.page.len(),
            persist: self.persist.len(),
        }
    }
}

/// Point-in-time snapshot of all queue depths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueDepths {
    pub listing: usize,
    pub namespace: usize,
    pub page: usize,
    pub persist: usize,
}

impl QueueDepths {
    pub fn total(&self) -> usize {
        self.listing + self.namespace + self.page + self.persist
    }
}
