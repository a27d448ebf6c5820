//! SQLite snapshot store.
//!
//! One append-only table, `job_counts`. Rows are only ever inserted; nothing
//! here updates or deletes history.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;

use crate::domain::model::{JobCount, Snapshot, StoredRow};
use crate::domain::ports::{SnapshotSink, SnapshotSource};
use crate::utils::error::{Result, ScrapeError};

#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    /// Opens (creating if missing) the database at `database_url` and ensures
    /// the schema exists.
    ///
    /// # Example URLs
    /// - `sqlite://mastercard_jobs.db`
    /// - `sqlite:///var/lib/jobcount/jobs.db`
    pub async fn open(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // single writer
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// In-memory store pinned to one connection (for testing).
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    /// Creates the table and index if absent. Safe to call repeatedly.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS job_counts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                country TEXT NOT NULL,
                job_count INTEGER NOT NULL CHECK (job_count >= 0),
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_job_counts_country_timestamp
                ON job_counts(country, timestamp);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn count_rows(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_counts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct JobCountRow {
    id: i64,
    country: String,
    job_count: i64,
    timestamp: String,
}

impl JobCountRow {
    fn into_stored_row(self) -> Result<StoredRow> {
        let job_count = JobCount::try_from(self.job_count)
            .map_err(|e| ScrapeError::PersistenceError(sqlx::Error::Decode(Box::new(e))))?;

        Ok(StoredRow {
            id: self.id,
            country: self.country,
            job_count,
            timestamp: self.timestamp,
        })
    }
}

#[async_trait]
impl SnapshotSink for SqliteSnapshotStore {
    async fn append(&self, snapshot: &Snapshot) -> Result<usize> {
        self.init().await?;

        let timestamp = snapshot.timestamp();
        let mut tx = self.pool.begin().await?;

        for (country, count) in snapshot.counts() {
            sqlx::query("INSERT INTO job_counts (country, job_count, timestamp) VALUES (?, ?, ?)")
                .bind(country.as_str())
                .bind(i64::from(*count))
                .bind(timestamp.as_str())
                .execute(&mut *tx)
                .await?;
        }

        // dropping an uncommitted transaction rolls it back
        tx.commit().await?;

        tracing::debug!("Appended {} rows at {}", snapshot.len(), timestamp);
        Ok(snapshot.len())
    }
}

#[async_trait]
impl SnapshotSource for SqliteSnapshotStore {
    async fn list_recent(&self, limit: u32) -> Result<Vec<StoredRow>> {
        let rows: Vec<JobCountRow> = sqlx::query_as(
            r#"
            SELECT id, country, job_count, timestamp
            FROM job_counts
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(JobCountRow::into_stored_row).collect()
    }

    async fn latest_for_country(&self, country: &str) -> Result<Option<StoredRow>> {
        let row: Option<JobCountRow> = sqlx::query_as(
            r#"
            SELECT id, country, job_count, timestamp
            FROM job_counts
            WHERE country = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(country)
        .fetch_optional(&self.pool)
        .await?;

        row.map(JobCountRow::into_stored_row).transpose()
    }
}
