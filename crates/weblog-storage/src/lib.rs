//! weblog-storage — `RecordSink` backends for weblog-consumer.
//!
//! Backends:
//! - [`mysql`] — MySQL via `sqlx` (production target, feature `mysql`)
//! - [`sqlite`] — SQLite via `sqlx` (local runs and tests, feature `sqlite`)
//!
//! Both write one row per accepted event into a table with the columns
//! listed in [`COLUMNS`]. Neither retries a failed insert.

pub mod options;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use options::{SinkOptions, DEFAULT_TABLE};

#[cfg(feature = "mysql")]
pub use mysql::MySqlRecordSink;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordSink;

/// Column order used by every backend's INSERT.
pub const COLUMNS: [&str; 9] = [
    "timestamp",
    "cusno",
    "url",
    "http_method",
    "response_time",
    "ip_address",
    "status_code",
    "service_id",
    "prod_cd",
];

/// Build the parameterised INSERT for `table`, quoting identifiers with
/// `quote` (backtick for MySQL, double quote for SQLite).
pub(crate) fn insert_sql(table: &str, quote: char) -> String {
    let columns = COLUMNS
        .iter()
        .map(|c| format!("{quote}{c}{quote}"))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; COLUMNS.len()].join(", ");
    format!("INSERT INTO {quote}{table}{quote} ({columns}) VALUES ({placeholders})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_statement_lists_all_columns() {
        let sql = insert_sql("TB_HR_TEST_WEB_LOG", '`');
        assert_eq!(
            sql,
            "INSERT INTO `TB_HR_TEST_WEB_LOG` (`timestamp`, `cusno`, `url`, `http_method`, \
             `response_time`, `ip_address`, `status_code`, `service_id`, `prod_cd`) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
    }
}
