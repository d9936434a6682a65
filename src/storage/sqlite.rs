//! SQLite implementation of the crawl store

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageResult, Store};
use crate::storage::PageRecord;
use crate::url::ArticleRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the store at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
    let alias_namespace: Option<String> = row.get(4)?;
    let alias_id: Option<String> = row.get(5)?;
    Ok(PageRecord {
        article: ArticleRef::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
        http_status: row.get(2)?,
        title: row.get(3)?,
        alias_of: match (alias_namespace, alias_id) {
            (Some(namespace), Some(id)) => Some(ArticleRef { namespace, id }),
            _ => None,
        },
    })
}

impl Store for SqliteStore {
    fn insert_page(
        &mut self,
        record: &PageRecord,
        links: &HashSet<ArticleRef>,
    ) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO pages (namespace, id, http_status, title, alias_of_namespace, alias_of_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.article.namespace,
                record.article.id,
                record.http_status,
                record.title,
                record.alias_of.as_ref().map(|a| a.namespace.as_str()),
                record.alias_of.as_ref().map(|a| a.id.as_str()),
            ],
        )?;

        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO links (namespace, id, link_namespace, link_id)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in links {
                stmt.execute(params![
                    record.article.namespace,
                    record.article.id,
                    link.namespace,
                    link.id,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_pages(&self) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT namespace, id, http_status, title, alias_of_namespace, alias_of_id FROM pages",
        )?;

        let pages = stmt
            .query_map([], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn dangling_targets(&self) -> StorageResult<Vec<ArticleRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT link_namespace, link_id FROM links
             WHERE NOT EXISTS (
                 SELECT 1 FROM pages
                 WHERE pages.namespace = links.link_namespace AND pages.id = links.link_id
             )
             UNION
             SELECT DISTINCT alias_of_namespace, alias_of_id FROM pages AS aliased
             WHERE alias_of_namespace IS NOT NULL
               AND NOT EXISTS (
                   SELECT 1 FROM pages
                   WHERE pages.namespace = aliased.alias_of_namespace
                     AND pages.id = aliased.alias_of_id
               )",
        )?;

        let targets = stmt
            .query_map([], |row| {
                Ok(ArticleRef::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(targets)
    }

    fn get_page(&self, article: &ArticleRef) -> StorageResult<Option<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT namespace, id, http_status, title, alias_of_namespace, alias_of_id
             FROM pages WHERE namespace = ?1 AND id = ?2 LIMIT 1",
        )?;

        let page = stmt
            .query_row(params![article.namespace, article.id], row_to_record)
            .optional()?;

        Ok(page)
    }

    fn links_from(&self, article: &ArticleRef) -> StorageResult<Vec<ArticleRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT link_namespace, link_id FROM links WHERE namespace = ?1 AND id = ?2",
        )?;

        let links = stmt
            .query_map(params![article.namespace, article.id], |row| {
                Ok(ArticleRef::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM links", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
