use rusqlite::{params, OptionalExtension};
use serde::Serialize;

use super::{now_timestamp, Database, StorageResult};

/// Stored verbatim; there is no hashing.
#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub platform: String,
    pub username: String,
    #[serde(skip)]
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing form with the password elided.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialSummary {
    pub platform: String,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Database {
    /// One row per platform; a second save overwrites username and password.
    pub async fn upsert_credential(
        &self,
        platform: &str,
        username: &str,
        password: &str,
    ) -> StorageResult<()> {
        let now = now_timestamp();
        let db = self.lock().await;
        db.execute(
            "INSERT INTO credentials (platform, username, password, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT(platform) DO UPDATE SET
                username = excluded.username,
                password = excluded.password,
                updated_at = excluded.updated_at",
            params![platform.to_lowercase(), username, password, now],
        )?;
        Ok(())
    }

    pub async fn get_credential(&self, platform: &str) -> StorageResult<Option<Credential>> {
        let db = self.lock().await;
        let row = db
            .query_row(
                "SELECT platform, username, password, created_at, updated_at
                 FROM credentials WHERE platform = ?1",
                params![platform.to_lowercase()],
                |row| {
                    Ok(Credential {
                        platform: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        created_at: row.get(3)?,
                        updated_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub async fn list_credentials(&self) -> StorageResult<Vec<CredentialSummary>> {
        let db = self.lock().await;
        let mut stmt = db.prepare(
            "SELECT platform, username, created_at, updated_at FROM credentials ORDER BY platform",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CredentialSummary {
                platform: row.get(0)?,
                username: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_overwrites_by_platform() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_credential("LinkedIn", "a@x.com", "one").await.unwrap();
        db.upsert_credential("linkedin", "b@x.com", "two").await.unwrap();

        let cred = db.get_credential("linkedin").await.unwrap().unwrap();
        assert_eq!(cred.username, "b@x.com");
        assert_eq!(cred.password, "two");

        let listed = db.list_credentials().await.unwrap();
        assert_eq!(listed.len(), 1);
        let json = serde_json::to_value(&listed[0]).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test]
    async fn test_missing_platform_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_credential("gupy").await.unwrap().is_none());
    }
}
