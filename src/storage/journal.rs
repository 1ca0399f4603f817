//! Attempt journal: one row per engine action on a posting in a run.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{now_timestamp, timestamp, Database, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Pending,
    Success,
    Failed,
    Skipped,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Success => "success",
            AttemptStatus::Failed => "failed",
            AttemptStatus::Skipped => "skipped",
        }
    }

    pub fn parse(raw: &str) -> StorageResult<Self> {
        match raw {
            "pending" => Ok(AttemptStatus::Pending),
            "success" => Ok(AttemptStatus::Success),
            "failed" => Ok(AttemptStatus::Failed),
            "skipped" => Ok(AttemptStatus::Skipped),
            other => Err(StorageError::InvalidStatus(other.to_string())),
        }
    }

    pub fn is_terminal(self) -> bool {
        self != AttemptStatus::Pending
    }
}

/// What the engine knows about a posting when it opens an attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAttempt {
    pub job_title: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default)]
    pub job_type: Option<String>,
}

fn default_platform() -> String {
    "LinkedIn".to_string()
}

/// Terminal transition payload for [`Database::mark`].
#[derive(Debug, Clone)]
pub struct AttemptUpdate {
    pub status: AttemptStatus,
    pub error_message: Option<String>,
    pub questions_answered: Option<serde_json::Value>,
    pub screenshot_path: Option<String>,
}

impl AttemptUpdate {
    pub fn new(status: AttemptStatus) -> Self {
        Self {
            status,
            error_message: None,
            questions_answered: None,
            screenshot_path: None,
        }
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error_message = error;
        self
    }

    pub fn with_questions(mut self, questions: Option<serde_json::Value>) -> Self {
        self.questions_answered = questions;
        self
    }

    pub fn with_screenshot(mut self, path: Option<String>) -> Self {
        self.screenshot_path = path;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub job_title: String,
    pub company_name: Option<String>,
    pub job_url: Option<String>,
    pub job_id: Option<String>,
    pub location: Option<String>,
    pub platform: String,
    pub status: AttemptStatus,
    pub error_message: Option<String>,
    pub questions_answered: Option<serde_json::Value>,
    pub attempted_at: String,
    pub completed_at: Option<String>,
    pub screenshot_path: Option<String>,
    pub run_id: Option<String>,
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_attempts: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub pending: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyStats {
    pub company_name: String,
    pub attempts: u64,
    pub successful: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalStatistics {
    pub total_attempts: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub pending: u64,
    pub success_rate: f64,
    pub top_companies: Vec<CompanyStats>,
}

const ATTEMPT_COLUMNS: &str = "id, job_title, company_name, job_url, job_id, location, platform,
    status, error_message, questions_answered, attempted_at, completed_at, screenshot_path,
    run_id, job_type";

fn attempt_from_row(row: &Row<'_>) -> rusqlite::Result<AttemptRecord> {
    let status: String = row.get(7)?;
    let questions: Option<String> = row.get(9)?;
    Ok(AttemptRecord {
        id: row.get(0)?,
        job_title: row.get(1)?,
        company_name: row.get(2)?,
        job_url: row.get(3)?,
        job_id: row.get(4)?,
        location: row.get(5)?,
        platform: row.get(6)?,
        status: AttemptStatus::parse(&status).unwrap_or(AttemptStatus::Pending),
        error_message: row.get(8)?,
        questions_answered: questions.and_then(|q| serde_json::from_str(&q).ok()),
        attempted_at: row.get(10)?,
        completed_at: row.get(11)?,
        screenshot_path: row.get(12)?,
        run_id: row.get(13)?,
        job_type: row.get(14)?,
    })
}

/// Percentage rounded to one decimal; zero when there is nothing to divide.
pub(crate) fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

impl Database {
    /// A successful attempt for the same posting inside the window, matched
    /// by platform id or by detail URL.
    pub async fn check_recent_duplicate(
        &self,
        job_id: Option<&str>,
        job_url: Option<&str>,
        window_days: i64,
    ) -> StorageResult<Option<AttemptRecord>> {
        if job_id.is_none() && job_url.is_none() {
            return Ok(None);
        }
        let since = timestamp(Utc::now() - ChronoDuration::days(window_days.max(0)));
        let db = self.lock().await;
        let sql = format!(
            "SELECT {} FROM application_attempts
             WHERE status = 'success'
               AND attempted_at >= ?1
               AND ((?2 IS NOT NULL AND job_id = ?2) OR (?3 IS NOT NULL AND job_url = ?3))
             ORDER BY attempted_at DESC LIMIT 1",
            ATTEMPT_COLUMNS
        );
        Ok(db
            .query_row(&sql, params![since, job_id, job_url], attempt_from_row)
            .optional()?)
    }

    pub async fn open_attempt(&self, attempt: &NewAttempt, run_id: Option<&str>) -> StorageResult<i64> {
        self.open_attempt_at(attempt, run_id, Utc::now()).await
    }

    /// Like [`open_attempt`](Self::open_attempt) with an explicit
    /// `attempted_at`, for importing history.
    pub async fn open_attempt_at(
        &self,
        attempt: &NewAttempt,
        run_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> StorageResult<i64> {
        let db = self.lock().await;
        db.execute(
            "INSERT INTO application_attempts
                (job_title, company_name, job_url, job_id, location, platform, status,
                 attempted_at, run_id, job_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8, ?9)",
            params![
                attempt.job_title,
                attempt.company_name,
                attempt.job_url,
                attempt.job_id,
                attempt.location,
                attempt.platform,
                timestamp(at),
                run_id,
                attempt.job_type
            ],
        )?;
        let id = db.last_insert_rowid();
        debug!("journal: opened attempt {} for '{}'", id, attempt.job_title);
        Ok(id)
    }

    /// The one transition out of `pending`. A terminal row never changes again.
    pub async fn mark(&self, id: i64, update: AttemptUpdate) -> StorageResult<()> {
        if !update.status.is_terminal() {
            return Err(StorageError::NotTerminal(update.status.as_str().to_string()));
        }
        let questions = update
            .questions_answered
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let db = self.lock().await;
        let changed = db.execute(
            "UPDATE application_attempts
             SET status = ?1,
                 error_message = ?2,
                 questions_answered = ?3,
                 screenshot_path = ?4,
                 completed_at = MAX(?5, attempted_at)
             WHERE id = ?6 AND status = 'pending'",
            params![
                update.status.as_str(),
                update.error_message,
                questions,
                update.screenshot_path,
                now_timestamp(),
                id
            ],
        )?;
        if changed == 1 {
            debug!("journal: attempt {} -> {}", id, update.status.as_str());
            return Ok(());
        }

        let current: Option<String> = db
            .query_row(
                "SELECT status FROM application_attempts WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            None => Err(StorageError::AttemptNotFound(id)),
            Some(status) => Err(StorageError::AttemptAlreadyTerminal { id, status }),
        }
    }

    pub async fn get_attempt(&self, id: i64) -> StorageResult<Option<AttemptRecord>> {
        let db = self.lock().await;
        let sql = format!("SELECT {} FROM application_attempts WHERE id = ?1", ATTEMPT_COLUMNS);
        Ok(db.query_row(&sql, params![id], attempt_from_row).optional()?)
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> StorageResult<Vec<AttemptRecord>> {
        let db = self.lock().await;
        let sql = format!(
            "SELECT {} FROM application_attempts ORDER BY attempted_at DESC, id DESC LIMIT ?1",
            ATTEMPT_COLUMNS
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], attempt_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// In insertion order.
    pub async fn attempts_for_run(&self, run_id: &str) -> StorageResult<Vec<AttemptRecord>> {
        let db = self.lock().await;
        let sql = format!(
            "SELECT {} FROM application_attempts WHERE run_id = ?1 ORDER BY id",
            ATTEMPT_COLUMNS
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params![run_id], attempt_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub async fn session_stats(&self, run_id: &str) -> StorageResult<SessionStats> {
        let db = self.lock().await;
        let mut stmt = db.prepare(
            "SELECT status, COUNT(*) FROM application_attempts WHERE run_id = ?1 GROUP BY status",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut stats = SessionStats::default();
        for row in rows {
            let (status, n) = row?;
            let n = n.max(0) as u64;
            stats.total_attempts += n;
            match AttemptStatus::parse(&status)? {
                AttemptStatus::Success => stats.successful += n,
                AttemptStatus::Failed => stats.failed += n,
                AttemptStatus::Skipped => stats.skipped += n,
                AttemptStatus::Pending => stats.pending += n,
            }
        }
        stats.success_rate = rate(stats.successful, stats.total_attempts);
        Ok(stats)
    }

    /// Global counts plus the ten employers with the most attempts.
    pub async fn statistics(&self) -> StorageResult<JournalStatistics> {
        let db = self.lock().await;
        let (total, successful, failed, skipped, pending): (i64, i64, i64, i64, i64) = db.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(status = 'success'), 0),
                    COALESCE(SUM(status = 'failed'), 0),
                    COALESCE(SUM(status = 'skipped'), 0),
                    COALESCE(SUM(status = 'pending'), 0)
             FROM application_attempts",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let mut stmt = db.prepare(
            "SELECT company_name, COUNT(*) AS n, COALESCE(SUM(status = 'success'), 0)
             FROM application_attempts
             WHERE company_name IS NOT NULL AND company_name != ''
             GROUP BY company_name
             ORDER BY n DESC, company_name ASC
             LIMIT 10",
        )?;
        let rows = stmt.query_map([], |row| {
            let attempts = row.get::<_, i64>(1)?.max(0) as u64;
            let ok = row.get::<_, i64>(2)?.max(0) as u64;
            Ok(CompanyStats {
                company_name: row.get(0)?,
                attempts,
                successful: ok,
                success_rate: rate(ok, attempts),
            })
        })?;
        let mut top_companies = Vec::new();
        for row in rows {
            top_companies.push(row?);
        }

        let total = total.max(0) as u64;
        let successful = successful.max(0) as u64;
        Ok(JournalStatistics {
            total_attempts: total,
            successful,
            failed: failed.max(0) as u64,
            skipped: skipped.max(0) as u64,
            pending: pending.max(0) as u64,
            success_rate: rate(successful, total),
            top_companies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(id: &str, company: &str) -> NewAttempt {
        NewAttempt {
            job_title: "Analista Financeiro".into(),
            company_name: Some(company.into()),
            job_url: Some(format!("https://www.linkedin.com/jobs/view/{}/", id)),
            job_id: Some(id.into()),
            platform: "LinkedIn".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rate_rounds_to_one_decimal() {
        assert_eq!(rate(1, 3), 33.3);
        assert_eq!(rate(2, 3), 66.7);
        assert_eq!(rate(0, 0), 0.0);
    }

    #[tokio::test]
    async fn test_mark_is_single_transition() {
        let db = Database::open_in_memory().unwrap();
        let id = db.open_attempt(&attempt("1", "Acme"), Some("run")).await.unwrap();

        db.mark(id, AttemptUpdate::new(AttemptStatus::Success)).await.unwrap();
        let err = db
            .mark(id, AttemptUpdate::new(AttemptStatus::Failed))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::AttemptAlreadyTerminal { .. }));

        let row = db.get_attempt(id).await.unwrap().unwrap();
        assert_eq!(row.status, AttemptStatus::Success);
        assert!(row.completed_at.unwrap() >= row.attempted_at);
    }

    #[tokio::test]
    async fn test_mark_rejects_pending_and_unknown() {
        let db = Database::open_in_memory().unwrap();
        let id = db.open_attempt(&attempt("1", "Acme"), None).await.unwrap();
        assert!(matches!(
            db.mark(id, AttemptUpdate::new(AttemptStatus::Pending)).await,
            Err(StorageError::NotTerminal(_))
        ));
        assert!(matches!(
            db.mark(999, AttemptUpdate::new(AttemptStatus::Failed)).await,
            Err(StorageError::AttemptNotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_completed_at_never_precedes_attempted_at() {
        let db = Database::open_in_memory().unwrap();
        let future = Utc::now() + ChronoDuration::hours(2);
        let id = db
            .open_attempt_at(&attempt("9", "Acme"), None, future)
            .await
            .unwrap();
        db.mark(id, AttemptUpdate::new(AttemptStatus::Failed)).await.unwrap();
        let row = db.get_attempt(id).await.unwrap().unwrap();
        assert_eq!(row.completed_at.as_deref(), Some(row.attempted_at.as_str()));
    }

    #[tokio::test]
    async fn test_questions_blob_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let id = db.open_attempt(&attempt("1", "Acme"), None).await.unwrap();
        let questions = serde_json::json!([{"question": "Pretensão salarial", "answer": "1900"}]);
        db.mark(
            id,
            AttemptUpdate::new(AttemptStatus::Success).with_questions(Some(questions.clone())),
        )
        .await
        .unwrap();
        let row = db.get_attempt(id).await.unwrap().unwrap();
        assert_eq!(row.questions_answered, Some(questions));
    }

    #[tokio::test]
    async fn test_statistics_top_companies() {
        let db = Database::open_in_memory().unwrap();
        for (i, company) in ["Acme", "Acme", "Beta"].iter().enumerate() {
            let id = db
                .open_attempt(&attempt(&i.to_string(), company), Some("r1"))
                .await
                .unwrap();
            let status = if i == 0 { AttemptStatus::Success } else { AttemptStatus::Failed };
            db.mark(id, AttemptUpdate::new(status)).await.unwrap();
        }
        let stats = db.statistics().await.unwrap();
        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.top_companies[0].company_name, "Acme");
        assert_eq!(stats.top_companies[0].success_rate, 50.0);

        let session = db.session_stats("r1").await.unwrap();
        assert_eq!(session.successful, 1);
        assert_eq!(session.failed, 2);
        assert_eq!(session.success_rate, 33.3);
    }
}
