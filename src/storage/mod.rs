//! Relational store: credentials, postings and the attempt journal.

mod credentials;
mod journal;
mod postings;

pub use credentials::{Credential, CredentialSummary};
pub use journal::{
    AttemptRecord, AttemptStatus, AttemptUpdate, CompanyStats, JournalStatistics, NewAttempt,
    SessionStats,
};
pub use postings::{NewPosting, PostingRecord, PostingStatus};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("attempt {0} not found")]
    AttemptNotFound(i64),

    #[error("attempt {id} is already terminal ({status})")]
    AttemptAlreadyTerminal { id: i64, status: String },

    #[error("'{0}' is not a terminal attempt status")]
    NotTerminal(String),

    #[error("invalid status '{0}'")]
    InvalidStatus(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Shared handle; clones point at the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// RFC 3339, microseconds, `Z`. Fixed width, so text order is time order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(dir);
            }
        }
        let conn = Connection::open(path)?;
        info!("🗄️ database opened at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS credentials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                platform TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS postings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                platform TEXT NOT NULL,
                job_id TEXT NOT NULL,
                title TEXT NOT NULL,
                company TEXT,
                location TEXT,
                url TEXT NOT NULL,
                description TEXT,
                salary_range TEXT,
                requirements TEXT,
                modality TEXT,
                job_type TEXT,
                status TEXT NOT NULL DEFAULT 'found',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(platform, job_id)
            );
            CREATE TABLE IF NOT EXISTS application_attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_title TEXT NOT NULL,
                company_name TEXT,
                job_url TEXT,
                job_id TEXT,
                location TEXT,
                platform TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                error_message TEXT,
                questions_answered TEXT,
                attempted_at TEXT NOT NULL,
                completed_at TEXT,
                screenshot_path TEXT,
                run_id TEXT,
                job_type TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_attempts_run ON application_attempts(run_id);
            CREATE INDEX IF NOT EXISTS idx_attempts_job ON application_attempts(job_id, job_url);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2025, 1, 9, 23, 59, 59).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert!(timestamp(a) < timestamp(b));
        assert!(timestamp(a).ends_with('Z'));
        assert_eq!(timestamp(a).len(), "2025-01-09T23:59:59.000000Z".len());
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock().await;
        conn.execute_batch("CREATE TABLE IF NOT EXISTS credentials (x INTEGER);")
            .unwrap();
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM application_attempts", [], |r| r.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }
}
