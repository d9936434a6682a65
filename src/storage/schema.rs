//! Database schema definitions

/// SQL schema for the crawl store
///
/// The (namespace, id) key on pages is not declared UNIQUE: the visited set
/// keeps the crawler from inserting a key twice within a run, and the
/// startup reseed tolerates whatever an interrupted run left behind.
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled article identity
CREATE TABLE IF NOT EXISTS pages (
    namespace TEXT NOT NULL,
    id TEXT NOT NULL,
    http_status INTEGER NOT NULL,
    title TEXT,
    alias_of_namespace TEXT,
    alias_of_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_pages_key ON pages(namespace, id);

-- Directed link edges from a source article to a referenced article;
-- targets may not have been crawled yet
CREATE TABLE IF NOT EXISTS links (
    namespace TEXT NOT NULL,
    id TEXT NOT NULL,
    link_namespace TEXT NOT NULL,
    link_id TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_links_source ON links(namespace, id);
CREATE INDEX IF NOT EXISTS idx_links_target ON links(link_namespace, link_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["pages", "links"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
