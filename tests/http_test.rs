/// HTTP surface: status codes and response shapes of the JSON API.
mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use apply_scout::{api, AppState, Database, Supervisor};

use support::{init_logger, temp_diagnostics, test_config, FakeDriver, FakeLauncher, FakeScript};

struct TestApp {
    router: Router,
    supervisor: Arc<Supervisor>,
    gate: Arc<tokio::sync::Notify>,
}

fn test_app() -> TestApp {
    init_logger();
    let db = Database::open_in_memory().unwrap();
    let config = test_config(json!({}));
    let gate = Arc::new(tokio::sync::Notify::new());
    let launcher = FakeLauncher::gated(FakeDriver::new(FakeScript::default()), Arc::clone(&gate));
    let supervisor = Arc::new(Supervisor::new(
        launcher,
        db.clone(),
        Arc::clone(&config),
        temp_diagnostics(),
    ));
    let state = AppState::new(db, Arc::clone(&supervisor)).with_config(config);
    TestApp {
        router: api::router(state),
        supervisor,
        gate,
    }
}

async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "apply-scout");
}

#[tokio::test]
async fn test_credentials_are_listed_without_password() {
    let app = test_app();
    let (status, _) = call(
        &app,
        Method::POST,
        "/credentials",
        Some(json!({"platform": "linkedin", "username": "ana@example.com", "password": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/credentials",
        Some(json!({"platform": "linkedin", "username": "ana@example.com", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Credenciais salvas com sucesso");

    let (status, body) = call(&app, Method::GET, "/credentials", None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().expect("array of credentials");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["username"], "ana@example.com");
    assert!(list[0].get("password").is_none(), "❌ FAIL: password leaked");
    assert!(!body.to_string().contains("s3cret"));
}

#[tokio::test]
async fn test_start_stop_lifecycle() {
    let app = test_app();
    call(
        &app,
        Method::POST,
        "/credentials",
        Some(json!({"platform": "linkedin", "username": "ana@example.com", "password": "s3cret"})),
    )
    .await;

    let (status, _) = call(&app, Method::POST, "/automation/stop", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let start = json!({
        "platforms": {"linkedin": true},
        "criteria": {"analista_financeiro": true, "max_applications": 2}
    });
    let (status, body) = call(&app, Method::POST, "/automation/start", Some(start.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = call(&app, Method::POST, "/automation/start", Some(start)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("already running"));

    let (_, body) = call(&app, Method::GET, "/automation/status", None).await;
    assert_eq!(body["status"]["running"], true);
    assert!(body["status"]["run_id"].is_string());

    let (status, body) = call(&app, Method::POST, "/automation/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Automação interrompida");

    app.gate.notify_one();
    app.supervisor.join().await;

    let (_, body) = call(&app, Method::GET, "/automation/status", None).await;
    assert_eq!(body["status"]["running"], false);
    let (_, body) = call(&app, Method::GET, "/automation/logs", None).await;
    let logs = body["logs"].as_array().expect("logs array");
    assert!(logs.iter().any(|l| l["level"] == "WARNING"));
    let (_, body) = call(&app, Method::GET, "/automation/results", None).await;
    assert_eq!(body["success"], true);
    assert!(body["jobs"].is_array());
}

#[tokio::test]
async fn test_manual_attempt_lifecycle() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/applications/create",
        Some(json!({
            "job_title": "Analista Financeiro",
            "company_name": "Acme",
            "job_id": "4100000055",
            "job_url": "https://www.linkedin.com/jobs/view/4100000055/",
            "session_id": "run-http"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "pending");
    assert_eq!(body["application"]["run_id"], "run-http");
    let id = body["application"]["id"].as_i64().expect("numeric id");

    let uri = format!("/applications/{}/update", id);
    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({"status": "pending"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::PUT, &uri, Some(json!({"status": "success"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "success");
    assert!(body["application"]["completed_at"].is_string());

    let (status, _) = call(&app, Method::PUT, &uri, Some(json!({"status": "failed"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::PUT,
        "/applications/999999/update",
        Some(json!({"status": "failed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(
        &app,
        Method::POST,
        "/applications/check-duplicate",
        Some(json!({"job_id": "4100000055"})),
    )
    .await;
    assert_eq!(body["is_duplicate"], true);
    assert_eq!(body["existing_application"]["id"], id);

    let (_, body) = call(
        &app,
        Method::POST,
        "/applications/check-duplicate",
        Some(json!({"job_id": "4100000099"})),
    )
    .await;
    assert_eq!(body["is_duplicate"], false);

    let (_, body) = call(&app, Method::GET, "/applications/session/run-http", None).await;
    assert_eq!(body["session_id"], "run-http");
    assert_eq!(body["statistics"]["successful"], 1);

    let (_, body) = call(&app, Method::GET, "/applications/history?limit=10", None).await;
    assert_eq!(body["total"], 1);
    let (_, body) = call(&app, Method::GET, "/applications/statistics", None).await;
    assert_eq!(body["statistics"]["total_attempts"], 1);
}

#[tokio::test]
async fn test_created_terminal_attempt_is_closed() {
    let app = test_app();
    let (status, body) = call(
        &app,
        Method::POST,
        "/applications/create",
        Some(json!({"job_title": "Analista de Custos", "status": "skipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["status"], "skipped");
    assert_eq!(body["application"]["platform"], "LinkedIn");
    assert!(body["application"]["completed_at"].is_string());
}

#[tokio::test]
async fn test_resume_endpoints() {
    let app = test_app();
    let (status, _) = call(&app, Method::POST, "/resume-analysis/analyze-text", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/resume-analysis/analyze-text",
        Some(json!({"text": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/resume-analysis/analyze-text",
        Some(json!({"text": "Analista financeiro com 3 anos de experiência em SAP e Excel."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["experience_years"], 3);
    assert!(body["analysis"]["job_scores"]["analista_financeiro"].as_f64().unwrap_or(0.0) > 0.0);

    let (_, body) = call(&app, Method::GET, "/resume-analysis/job-keywords", None).await;
    assert!(body["keywords"]["contas_pagar"].is_array());
    let (_, body) = call(&app, Method::GET, "/resume-analysis/analysis-tips", None).await;
    assert!(body["tips"]["general"].as_array().is_some_and(|t| !t.is_empty()));
}
