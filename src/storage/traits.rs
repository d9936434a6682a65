//! Storage trait and error types

use crate::storage::PageRecord;
use crate::url::ArticleRef;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the crawl store
///
/// One implementation backs the real crawl (SQLite); the trait seam exists
/// so the persistence worker and scheduler seeding can be exercised against
/// in-memory fakes.
pub trait Store {
    /// Inserts one page record and its outbound links in a single
    /// transaction
    ///
    /// Either the page row and every link row land together, or none do.
    fn insert_page(&mut self, record: &PageRecord, links: &HashSet<ArticleRef>)
        -> StorageResult<()>;

    /// Loads every persisted page record (startup visited-set reseed)
    fn load_pages(&self) -> StorageResult<Vec<PageRecord>>;

    /// Finds every referenced article with no page row of its own: link
    /// targets and alias targets that were never crawled
    fn dangling_targets(&self) -> StorageResult<Vec<ArticleRef>>;

    /// Gets a page record by its natural key
    fn get_page(&self, article: &ArticleRef) -> StorageResult<Option<PageRecord>>;

    /// Gets the link targets recorded for one source article
    fn links_from(&self, article: &ArticleRef) -> StorageResult<Vec<ArticleRef>>;

    /// Total persisted pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Total persisted links
    fn count_links(&self) -> StorageResult<u64>;
}
