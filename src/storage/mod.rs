//! Storage module for persisting crawl data
//!
//! The store holds two tables, pages and links, keyed by article identity.
//! It is read once at startup to reseed an interrupted crawl and written by
//! the persistence worker during the run.

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, Store};

use crate::url::ArticleRef;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Store handle shared between the scheduler and the persistence worker
pub type SharedStore = Arc<Mutex<dyn Store + Send>>;

/// Initializes or opens a crawl store
pub fn open_storage(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// One crawled article identity and its extracted metadata
///
/// `alias_of` is populated when the article URL resolved through redirects
/// to a different identity; the links of such a page are attributed to the
/// canonical target, never to the alias row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub article: ArticleRef,
    pub http_status: u16,
    pub title: Option<String>,
    pub alias_of: Option<ArticleRef>,
}

impl PageRecord {
    pub fn is_alias(&self) -> bool {
        self.alias_of.is_some()
    }
}
