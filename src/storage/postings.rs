use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{now_timestamp, Database, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Found,
    Applied,
    ApplicationFailed,
    ApplicationError,
    AlreadyApplied,
}

impl PostingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostingStatus::Found => "found",
            PostingStatus::Applied => "applied",
            PostingStatus::ApplicationFailed => "application_failed",
            PostingStatus::ApplicationError => "application_error",
            PostingStatus::AlreadyApplied => "already_applied",
        }
    }

    pub fn parse(raw: &str) -> StorageResult<Self> {
        match raw {
            "found" => Ok(PostingStatus::Found),
            "applied" => Ok(PostingStatus::Applied),
            "application_failed" => Ok(PostingStatus::ApplicationFailed),
            "application_error" => Ok(PostingStatus::ApplicationError),
            "already_applied" => Ok(PostingStatus::AlreadyApplied),
            other => Err(StorageError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPosting {
    pub platform: String,
    pub job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub salary_range: Option<String>,
    pub requirements: Option<String>,
    pub modality: Option<String>,
    pub job_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostingRecord {
    pub id: i64,
    pub platform: String,
    pub job_id: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub url: String,
    pub description: Option<String>,
    pub salary_range: Option<String>,
    pub requirements: Option<String>,
    pub modality: Option<String>,
    pub job_type: Option<String>,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

const POSTING_COLUMNS: &str = "id, platform, job_id, title, company, location, url, description,
    salary_range, requirements, modality, job_type, status, created_at, updated_at";

fn posting_from_row(row: &Row<'_>) -> rusqlite::Result<PostingRecord> {
    Ok(PostingRecord {
        id: row.get(0)?,
        platform: row.get(1)?,
        job_id: row.get(2)?,
        title: row.get(3)?,
        company: row.get(4)?,
        location: row.get(5)?,
        url: row.get(6)?,
        description: row.get(7)?,
        salary_range: row.get(8)?,
        requirements: row.get(9)?,
        modality: row.get(10)?,
        job_type: row.get(11)?,
        status: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl Database {
    /// Insert if new, else refresh the descriptive columns. Status and
    /// `created_at` of an existing row are kept.
    pub async fn upsert_posting(&self, posting: &NewPosting) -> StorageResult<i64> {
        let now = now_timestamp();
        let db = self.lock().await;
        db.execute(
            "INSERT INTO postings (platform, job_id, title, company, location, url, description,
                salary_range, requirements, modality, job_type, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'found', ?12, ?12)
             ON CONFLICT(platform, job_id) DO UPDATE SET
                title = excluded.title,
                company = COALESCE(excluded.company, company),
                location = COALESCE(excluded.location, location),
                url = excluded.url,
                description = COALESCE(excluded.description, description),
                salary_range = COALESCE(excluded.salary_range, salary_range),
                requirements = COALESCE(excluded.requirements, requirements),
                modality = COALESCE(excluded.modality, modality),
                job_type = COALESCE(excluded.job_type, job_type),
                updated_at = excluded.updated_at",
            params![
                posting.platform,
                posting.job_id,
                posting.title,
                posting.company,
                posting.location,
                posting.url,
                posting.description,
                posting.salary_range,
                posting.requirements,
                posting.modality,
                posting.job_type,
                now
            ],
        )?;
        let id = db.query_row(
            "SELECT id FROM postings WHERE platform = ?1 AND job_id = ?2",
            params![posting.platform, posting.job_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub async fn set_posting_status(
        &self,
        platform: &str,
        job_id: &str,
        status: PostingStatus,
    ) -> StorageResult<bool> {
        let db = self.lock().await;
        let n = db.execute(
            "UPDATE postings SET status = ?1, updated_at = ?2 WHERE platform = ?3 AND job_id = ?4",
            params![status.as_str(), now_timestamp(), platform, job_id],
        )?;
        Ok(n > 0)
    }

    pub async fn get_posting(&self, platform: &str, job_id: &str) -> StorageResult<Option<PostingRecord>> {
        let db = self.lock().await;
        let sql = format!(
            "SELECT {} FROM postings WHERE platform = ?1 AND job_id = ?2",
            POSTING_COLUMNS
        );
        Ok(db
            .query_row(&sql, params![platform, job_id], posting_from_row)
            .optional()?)
    }

    /// Most recently touched first.
    pub async fn list_postings(&self, limit: usize) -> StorageResult<Vec<PostingRecord>> {
        let db = self.lock().await;
        let sql = format!(
            "SELECT {} FROM postings ORDER BY updated_at DESC, id DESC LIMIT ?1",
            POSTING_COLUMNS
        );
        let mut stmt = db.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], posting_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
