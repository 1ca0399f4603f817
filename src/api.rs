//! JSON surface for the front-end: credentials, run control, history and
//! the résumé scorer.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::core::error::SupervisorError;
use crate::core::types::*;
use crate::core::AppState;
use crate::resume::{self, catalog, ResumeError};
use crate::storage::{AttemptUpdate, StorageError};
use crate::supervisor::StartRequest;

pub const DEFAULT_MAX_APPLICATIONS: u32 = 5;
pub const DEFAULT_LIST_LIMIT: usize = 50;

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult = Result<Json<Value>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn storage_error(context: &str, e: StorageError) -> ApiError {
    let status = match &e {
        StorageError::AttemptNotFound(_) => StatusCode::NOT_FOUND,
        StorageError::AttemptAlreadyTerminal { .. } => StatusCode::CONFLICT,
        StorageError::NotTerminal(_) | StorageError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("{} error: {}", context, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    api_error(status, e.to_string())
}

fn resume_error(e: ResumeError) -> ApiError {
    match e {
        ResumeError::PdfExtraction(_) => {
            error!("Resume analysis error: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        other => api_error(StatusCode::BAD_REQUEST, other.to_string()),
    }
}

pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/credentials", post(save_credentials).get(list_credentials))
        .route("/automation/start", post(start_automation))
        .route("/automation/status", get(automation_status))
        .route("/automation/stop", post(stop_automation))
        .route("/automation/results", get(automation_results))
        .route("/automation/logs", get(automation_logs))
        .route("/jobs", get(list_jobs))
        .route("/applications/history", get(application_history))
        .route("/applications/statistics", get(application_statistics))
        .route("/applications/session/{run_id}", get(session_statistics))
        .route("/applications/check-duplicate", post(check_duplicate))
        .route("/applications/create", post(create_attempt))
        .route("/applications/{id}/update", put(update_attempt))
        .route("/resume-analysis/upload-resume", post(upload_resume))
        .route("/resume-analysis/analyze-text", post(analyze_text))
        .route("/resume-analysis/job-keywords", get(job_keywords))
        .route("/resume-analysis/analysis-tips", get(analysis_tips))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "apply-scout",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ── Credentials ──────────────────────────────────────────────────────────────

async fn save_credentials(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CredentialRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    for (field, value) in [
        ("platform", &request.platform),
        ("username", &request.username),
        ("password", &request.password),
    ] {
        if value.trim().is_empty() {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("field '{}' is required", field),
            ));
        }
    }
    state
        .db
        .upsert_credential(&request.platform, &request.username, &request.password)
        .await
        .map_err(|e| storage_error("Credentials", e))?;
    info!("credentials saved for platform {}", request.platform);
    Ok(Json(MessageResponse {
        message: "Credenciais salvas com sucesso".to_string(),
    }))
}

async fn list_credentials(State(state): State<Arc<AppState>>) -> ApiResult {
    match state.db.list_credentials().await {
        Ok(list) => Ok(Json(json!(list))),
        Err(e) => Err(storage_error("Credentials", e)),
    }
}

// ── Run control ──────────────────────────────────────────────────────────────

async fn start_automation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartAutomationRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let criteria = &request.criteria;
    let start = StartRequest {
        platforms: request.platforms(),
        categories: criteria.categories(),
        max_applications: criteria.max_applications.unwrap_or(DEFAULT_MAX_APPLICATIONS),
        region: criteria.region.clone(),
        distance_km: criteria.distance_km,
        sort: criteria.sort,
    };
    match state.supervisor.start(start) {
        Ok(run_id) => {
            info!("automation started: run {}", run_id);
            Ok(Json(SuccessResponse {
                success: true,
                message: Some("Automação iniciada com sucesso".to_string()),
            }))
        }
        Err(e @ SupervisorError::AlreadyRunning) => {
            warn!("start refused: {}", e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn automation_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "status": state.supervisor.status() }))
}

async fn stop_automation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .supervisor
        .stop()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(SuccessResponse {
        success: true,
        message: Some("Automação interrompida".to_string()),
    }))
}

async fn automation_results(State(state): State<Arc<AppState>>) -> ApiResult {
    let jobs = state
        .db
        .list_postings(DEFAULT_LIST_LIMIT)
        .await
        .map_err(|e| storage_error("Results", e))?;
    Ok(Json(json!({
        "success": true,
        "results": state.supervisor.results(),
        "jobs": jobs
    })))
}

async fn automation_logs(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "success": true, "logs": state.supervisor.logs() }))
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult {
    let jobs = state
        .db
        .list_postings(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await
        .map_err(|e| storage_error("Jobs", e))?;
    Ok(Json(json!({ "success": true, "total": jobs.len(), "jobs": jobs })))
}

// ── Attempt journal ──────────────────────────────────────────────────────────

async fn application_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult {
    let applications = state
        .db
        .recent(query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await
        .map_err(|e| storage_error("History", e))?;
    Ok(Json(json!({
        "success": true,
        "total": applications.len(),
        "applications": applications
    })))
}

async fn application_statistics(State(state): State<Arc<AppState>>) -> ApiResult {
    let statistics = state
        .db
        .statistics()
        .await
        .map_err(|e| storage_error("Statistics", e))?;
    Ok(Json(json!({ "success": true, "statistics": statistics })))
}

async fn session_statistics(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> ApiResult {
    let statistics = state
        .db
        .session_stats(&run_id)
        .await
        .map_err(|e| storage_error("Session statistics", e))?;
    Ok(Json(json!({
        "success": true,
        "session_id": run_id,
        "statistics": statistics
    })))
}

async fn check_duplicate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CheckDuplicateRequest>,
) -> ApiResult {
    let days = request
        .days
        .unwrap_or_else(|| state.config.resolve_duplicate_window_days());
    let existing = state
        .db
        .check_recent_duplicate(request.job_id.as_deref(), request.job_url.as_deref(), days)
        .await
        .map_err(|e| storage_error("Duplicate check", e))?;
    Ok(Json(match existing {
        Some(record) => json!({
            "success": true,
            "is_duplicate": true,
            "existing_application": record
        }),
        None => json!({ "success": true, "is_duplicate": false }),
    }))
}

async fn create_attempt(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAttemptRequest>,
) -> ApiResult {
    let db = &state.db;
    let id = db
        .open_attempt(&request.attempt, request.run_id.as_deref())
        .await
        .map_err(|e| storage_error("Create attempt", e))?;
    if let Some(status) = request.status.filter(|s| s.is_terminal()) {
        db.mark(id, AttemptUpdate::new(status))
            .await
            .map_err(|e| storage_error("Create attempt", e))?;
    }
    let record = db
        .get_attempt(id)
        .await
        .map_err(|e| storage_error("Create attempt", e))?;
    Ok(Json(json!({ "success": true, "application": record })))
}

async fn update_attempt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAttemptRequest>,
) -> ApiResult {
    let update = AttemptUpdate::new(request.status)
        .with_error(request.error_message)
        .with_questions(request.questions_answered)
        .with_screenshot(request.screenshot_path);
    state
        .db
        .mark(id, update)
        .await
        .map_err(|e| storage_error("Update attempt", e))?;
    let record = state
        .db
        .get_attempt(id)
        .await
        .map_err(|e| storage_error("Update attempt", e))?;
    Ok(Json(json!({ "success": true, "application": record })))
}

// ── Résumé scorer ────────────────────────────────────────────────────────────

async fn upload_resume(mut multipart: Multipart) -> ApiResult {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() != Some("resume") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        upload = Some((filename, bytes));
    }
    let (filename, bytes) = upload.ok_or_else(|| resume_error(ResumeError::MissingFile))?;
    if filename.is_empty() {
        return Err(resume_error(ResumeError::MissingFile));
    }

    // pdf-extract is synchronous and can be slow on large files.
    let name = filename.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        resume::extract_text(&name, &bytes).and_then(|text| resume::analyze(&text))
    })
    .await
    .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
    .map_err(resume_error)?;

    info!("résumé analysed: {}", filename);
    Ok(Json(json!({
        "success": true,
        "analysis": analysis,
        "filename": filename
    })))
}

async fn analyze_text(Json(request): Json<AnalyzeTextRequest>) -> ApiResult {
    let text = request
        .text
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "field 'text' is required"))?;
    let analysis = resume::analyze(&text).map_err(resume_error)?;
    Ok(Json(json!({ "success": true, "analysis": analysis })))
}

fn catalog_map(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

async fn job_keywords() -> Json<Value> {
    Json(json!({ "success": true, "keywords": catalog_map(catalog::JOB_KEYWORDS) }))
}

async fn analysis_tips() -> Json<Value> {
    Json(json!({ "success": true, "tips": catalog_map(catalog::ANALYSIS_TIPS) }))
}
