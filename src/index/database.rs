//! Database operations for the index module

use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{InsertOutcome, PageRecord};
use libsql::{Connection, Row, params};
use tracing::{debug, instrument};

/// Persistent, deduplicated record of crawled pages
///
/// The store is owned explicitly and passed to whoever needs it; cloning it
/// shares the underlying connection.
#[derive(Clone)]
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Create a new store over an open connection
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection) -> Result<Self, DbError> {
        schema::initialize_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Open (or create) a store backed by a local database file
    pub async fn open(path: &str) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn).await
    }

    /// Check whether a page with exactly this URL is indexed
    #[instrument(skip(self), level = "debug")]
    pub async fn exists(&self, url: &str) -> Result<bool, DbError> {
        let mut rows = self
            .conn
            .query("SELECT 1 FROM pages WHERE url = ?", params![url.to_string()])
            .await
            .map_err(|e| DbError::Query(format!("Failed to look up page: {}", e)))?;

        Ok(rows.next().await?.is_some())
    }

    /// Insert a page unless its URL is already indexed
    ///
    /// Uniqueness is enforced by the table constraint, so racing inserts of
    /// the same URL produce one `Inserted` and any number of `AlreadyExists`.
    #[instrument(skip(self, title), level = "debug")]
    pub async fn insert(&self, url: &str, title: &str) -> Result<InsertOutcome, DbError> {
        let now = chrono::Utc::now().timestamp();

        let changed = self
            .conn
            .execute(
                "INSERT INTO pages (url, title, crawled_at) VALUES (?, ?, ?)
                 ON CONFLICT(url) DO NOTHING",
                params![url.to_string(), title.to_string(), now],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert page: {}", e)))?;

        if changed == 0 {
            debug!("Page already indexed: {}", url);
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }

    /// Total number of indexed pages
    pub async fn count(&self) -> Result<i64, DbError> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM pages", params![])
            .await
            .map_err(|e| DbError::Query(format!("Failed to count pages: {}", e)))?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| DbError::Data("COUNT(*) returned no rows".to_string()))?;

        row.get(0)
            .map_err(|e| DbError::Data(format!("Failed to get count: {}", e)))
    }

    /// Find pages whose title (and optionally URL) matches a `LIKE` pattern
    ///
    /// The pattern uses `\` as its escape character.
    #[instrument(skip(self))]
    pub async fn find_pages(
        &self,
        pattern: &str,
        match_urls: bool,
        limit: usize,
    ) -> Result<Vec<PageRecord>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut rows = if match_urls {
            self.conn
                .query(
                    "SELECT id, url, title, crawled_at FROM pages
                     WHERE title LIKE ? ESCAPE '\\' OR url LIKE ? ESCAPE '\\'
                     ORDER BY id
                     LIMIT ?",
                    params![pattern.to_string(), pattern.to_string(), limit],
                )
                .await
        } else {
            self.conn
                .query(
                    "SELECT id, url, title, crawled_at FROM pages
                     WHERE title LIKE ? ESCAPE '\\'
                     ORDER BY id
                     LIMIT ?",
                    params![pattern.to_string(), limit],
                )
                .await
        }
        .map_err(|e| DbError::Query(format!("Failed to search pages: {}", e)))?;

        let mut pages = Vec::new();
        while let Some(row) = rows.next().await? {
            pages.push(self.row_to_page(&row)?);
        }

        Ok(pages)
    }

    /// Most recently indexed pages, newest first
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: usize) -> Result<Vec<PageRecord>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut rows = self
            .conn
            .query(
                "SELECT id, url, title, crawled_at FROM pages ORDER BY id DESC LIMIT ?",
                params![limit],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to list pages: {}", e)))?;

        let mut pages = Vec::new();
        while let Some(row) = rows.next().await? {
            pages.push(self.row_to_page(&row)?);
        }

        Ok(pages)
    }

    /// Convert a database row to a PageRecord
    fn row_to_page(&self, row: &Row) -> Result<PageRecord, DbError> {
        Ok(PageRecord {
            id: row
                .get(0)
                .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?,
            url: row
                .get(1)
                .map_err(|e| DbError::Data(format!("Failed to get url: {}", e)))?,
            title: row
                .get(2)
                .map_err(|e| DbError::Data(format!("Failed to get title: {}", e)))?,
            crawled_at: row
                .get(3)
                .map_err(|e| DbError::Data(format!("Failed to get crawled_at: {}", e)))?,
        })
    }
}
