/// Attempt journal against a file-backed database: duplicate windows,
/// per-run statistics and reopening.
use chrono::{Duration as ChronoDuration, Utc};
use tokio_test::{assert_err, assert_ok};

use apply_scout::storage::{AttemptStatus, AttemptUpdate, NewAttempt, StorageError};
use apply_scout::Database;

fn attempt(job_id: &str, company: &str) -> NewAttempt {
    NewAttempt {
        job_title: "Analista Financeiro".into(),
        company_name: Some(company.into()),
        job_url: Some(format!("https://www.linkedin.com/jobs/view/{}/", job_id)),
        job_id: Some(job_id.into()),
        platform: "LinkedIn".into(),
        ..Default::default()
    }
}

fn temp_db_path() -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("apply-scout-journal-{}", uuid::Uuid::new_v4()))
        .join("journal.db")
}

#[tokio::test]
async fn test_duplicate_window_only_counts_recent_successes() {
    let db = Database::open_in_memory().unwrap();
    let now = Utc::now();

    let old = db
        .open_attempt_at(&attempt("1", "Acme"), None, now - ChronoDuration::days(45))
        .await
        .unwrap();
    db.mark(old, AttemptUpdate::new(AttemptStatus::Success)).await.unwrap();

    let failed = db
        .open_attempt_at(&attempt("2", "Globex"), None, now - ChronoDuration::days(2))
        .await
        .unwrap();
    db.mark(
        failed,
        AttemptUpdate::new(AttemptStatus::Failed).with_error(Some("form stalled".into())),
    )
    .await
    .unwrap();

    let recent = db
        .open_attempt_at(&attempt("3", "Initech"), None, now - ChronoDuration::days(5))
        .await
        .unwrap();
    db.mark(recent, AttemptUpdate::new(AttemptStatus::Success)).await.unwrap();

    assert!(db.check_recent_duplicate(Some("1"), None, 30).await.unwrap().is_none());
    assert!(db.check_recent_duplicate(Some("1"), None, 60).await.unwrap().is_some());
    assert!(db.check_recent_duplicate(Some("2"), None, 30).await.unwrap().is_none());

    let by_url = db
        .check_recent_duplicate(None, Some("https://www.linkedin.com/jobs/view/3/"), 30)
        .await
        .unwrap()
        .expect("match by url");
    assert_eq!(by_url.id, recent);
    assert!(db.check_recent_duplicate(None, None, 30).await.unwrap().is_none());
}

#[tokio::test]
async fn test_session_stats_are_scoped_to_one_run() {
    let db = Database::open_in_memory().unwrap();
    let outcomes = [
        AttemptStatus::Success,
        AttemptStatus::Failed,
        AttemptStatus::Skipped,
        AttemptStatus::Success,
    ];
    for (i, status) in outcomes.iter().enumerate() {
        let id = db
            .open_attempt(&attempt(&format!("r{}", i), "Acme"), Some("run-a"))
            .await
            .unwrap();
        db.mark(id, AttemptUpdate::new(*status)).await.unwrap();
    }
    db.open_attempt(&attempt("other", "Acme"), Some("run-b")).await.unwrap();

    let stats = db.session_stats("run-a").await.unwrap();
    assert_eq!(stats.total_attempts, 4);
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.success_rate, 50.0);

    let other = db.session_stats("run-b").await.unwrap();
    assert_eq!(other.total_attempts, 1);
    assert_eq!(other.pending, 1);
}

#[tokio::test]
async fn test_terminal_rows_survive_reopen() {
    let path = temp_db_path();
    let id = {
        let db = Database::open(&path).unwrap();
        let id = db.open_attempt(&attempt("9", "Acme"), Some("run-x")).await.unwrap();
        db.mark(
            id,
            AttemptUpdate::new(AttemptStatus::Failed).with_error(Some("confirmation timeout".into())),
        )
        .await
        .unwrap();
        id
    };

    let db = assert_ok!(Database::open(&path));
    let row = assert_ok!(db.get_attempt(id).await).expect("row persisted");
    assert_eq!(row.status, AttemptStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("confirmation timeout"));
    assert!(row.completed_at.as_deref().is_some_and(|c| c >= row.attempted_at.as_str()));

    let again = assert_err!(db.mark(id, AttemptUpdate::new(AttemptStatus::Success)).await);
    assert!(matches!(again, StorageError::AttemptAlreadyTerminal { .. }));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
