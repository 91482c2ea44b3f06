//! SQLite record sink for local runs and tests.
//!
//! Unlike the MySQL sink this one creates its table on open, so a fresh
//! file (or `sqlite::memory:`) is usable immediately.
//!
//! # Usage
//! ```rust,no_run
//! use weblog_storage::{SinkOptions, SqliteRecordSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed
//! let sink = SqliteRecordSink::open("./weblog.db", SinkOptions::default()).await?;
//!
//! // In-memory
//! let sink = SqliteRecordSink::in_memory(SinkOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::time::Duration;
use tracing::debug;

use weblog_core::{PersistedRecord, PipelineError, RecordSink};

use crate::options::SinkOptions;

/// SQLite-backed [`RecordSink`].
#[derive(Clone)]
pub struct SqliteRecordSink {
    pool: SqlitePool,
    table: String,
    insert_sql: String,
}

impl SqliteRecordSink {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// `path` may be a file path (`"./weblog.db"`) or a full SQLite URL
    /// (`"sqlite:./weblog.db?mode=rwc"`).
    pub async fn open(path: &str, opts: SinkOptions) -> Result<Self, PipelineError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };
        Self::connect(&url, opts).await
    }

    /// Open a private in-memory database. Data is lost when the sink drops.
    pub async fn in_memory(opts: SinkOptions) -> Result<Self, PipelineError> {
        // Every pooled connection to `sqlite::memory:` is its own database,
        // so pin the pool to one connection.
        Self::connect(
            "sqlite::memory:",
            SinkOptions {
                max_connections: 1,
                ..opts
            },
        )
        .await
    }

    async fn connect(url: &str, opts: SinkOptions) -> Result<Self, PipelineError> {
        opts.validate()?;

        let pool = SqlitePoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(Duration::from_secs(opts.connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| PipelineError::connection("sqlite", e))?;

        let sink = Self {
            pool,
            insert_sql: crate::insert_sql(&opts.table, '"'),
            table: opts.table,
        };
        sink.init_schema().await?;
        Ok(sink)
    }

    async fn init_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                \"timestamp\" TEXT    NOT NULL,
                cusno         TEXT    NOT NULL,
                url           TEXT,
                http_method   TEXT,
                response_time INTEGER,
                ip_address    TEXT,
                status_code   INTEGER,
                service_id    TEXT,
                prod_cd       TEXT
            );",
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::connection("sqlite", e))?;

        debug!(table = %self.table, "SqliteRecordSink schema initialized");
        Ok(())
    }

    /// Number of stored rows.
    pub async fn count(&self) -> Result<u64, PipelineError> {
        let row = sqlx::query(&format!("SELECT COUNT(*) AS n FROM \"{}\"", self.table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::Persist(e.to_string()))?;
        let n: i64 = row.try_get("n").map_err(|e| PipelineError::Persist(e.to_string()))?;
        Ok(n as u64)
    }

    /// All stored rows in insertion order.
    pub async fn records(&self) -> Result<Vec<PersistedRecord>, PipelineError> {
        let rows = sqlx::query(&format!(
            "SELECT \"timestamp\", cusno, url, http_method, response_time, ip_address, \
             status_code, service_id, prod_cd FROM \"{}\" ORDER BY id ASC",
            self.table
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::Persist(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let get_err = |e: sqlx::Error| PipelineError::Persist(e.to_string());
                Ok(PersistedRecord {
                    timestamp: row.try_get::<DateTime<Utc>, _>("timestamp").map_err(get_err)?,
                    cusno: row.try_get("cusno").map_err(get_err)?,
                    url: row.try_get("url").map_err(get_err)?,
                    http_method: row.try_get("http_method").map_err(get_err)?,
                    response_time: row.try_get("response_time").map_err(get_err)?,
                    ip_address: row.try_get("ip_address").map_err(get_err)?,
                    status_code: row.try_get("status_code").map_err(get_err)?,
                    service_id: row.try_get("service_id").map_err(get_err)?,
                    prod_cd: row.try_get("prod_cd").map_err(get_err)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RecordSink for SqliteRecordSink {
    async fn append(&self, record: &PersistedRecord) -> Result<(), PipelineError> {
        sqlx::query(&self.insert_sql)
            .bind(record.timestamp)
            .bind(&record.cusno)
            .bind(&record.url)
            .bind(&record.http_method)
            .bind(record.response_time)
            .bind(&record.ip_address)
            .bind(record.status_code)
            .bind(&record.service_id)
            .bind(&record.prod_cd)
            .execute(&self.pool)
            .await
            .map_err(|e| PipelineError::Persist(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(cusno: &str) -> PersistedRecord {
        PersistedRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            cusno: cusno.into(),
            url: Some("/a".into()),
            http_method: Some("GET".into()),
            response_time: Some(12),
            ip_address: Some("1.2.3.4".into()),
            status_code: Some(200),
            service_id: Some("S1".into()),
            prod_cd: Some("P1".into()),
        }
    }

    #[tokio::test]
    async fn append_and_read_back() {
        let sink = SqliteRecordSink::in_memory(SinkOptions::default()).await.unwrap();
        let rec = sample("C1");
        sink.append(&rec).await.unwrap();

        let rows = sink.records().await.unwrap();
        assert_eq!(rows, vec![rec]);
    }

    #[tokio::test]
    async fn null_columns_roundtrip() {
        let sink = SqliteRecordSink::in_memory(SinkOptions::default()).await.unwrap();
        let rec = PersistedRecord {
            url: None,
            response_time: None,
            status_code: None,
            ..sample("C2")
        };
        sink.append(&rec).await.unwrap();

        let rows = sink.records().await.unwrap();
        assert!(rows[0].url.is_none());
        assert!(rows[0].response_time.is_none());
        assert_eq!(rows[0].cusno, "C2");
    }

    #[tokio::test]
    async fn duplicate_appends_create_duplicate_rows() {
        let sink = SqliteRecordSink::in_memory(SinkOptions::default()).await.unwrap();
        sink.append(&sample("C1")).await.unwrap();
        sink.append(&sample("C1")).await.unwrap();
        assert_eq!(sink.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn custom_table_name() {
        let opts = SinkOptions::default().with_table("vip_web_log");
        let sink = SqliteRecordSink::in_memory(opts).await.unwrap();
        sink.append(&sample("C1")).await.unwrap();
        assert_eq!(sink.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn invalid_table_name_fails_before_connecting() {
        let opts = SinkOptions::default().with_table("bad-name");
        let err = SqliteRecordSink::in_memory(opts).await.err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
