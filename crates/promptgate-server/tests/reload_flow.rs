//! End-to-end tests for hot policy reload over the HTTP adapter

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use promptgate_filters::SimilarityGuard;
use promptgate_policy::{PolicyEngine, PolicyStore};
use promptgate_server::{create_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const INITIAL: &str = r#"
banned_keywords: [kill]
max_prompt_chars: 100
redaction_rules:
  redact_emails: true
"#;

fn temp_policy(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn router_for(file: &tempfile::NamedTempFile) -> axum::Router {
    let store = Arc::new(PolicyStore::load(file.path()).unwrap());
    let engine = Arc::new(PolicyEngine::new(store, SimilarityGuard::disabled()));
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    create_router(AppState::new(engine, handle))
}

async fn mitigate(router: &axum::Router, prompt: &str) -> Value {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/mitigate")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"prompt": prompt, "user_id": "u1"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_reload(router: &axum::Router) -> StatusCode {
    router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/reload")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_startup_fails_closed_on_invalid_policy() {
    let file = temp_policy("max_prompt_chars: {nonsense");
    assert!(PolicyStore::load(file.path()).is_err());
}

#[tokio::test]
async fn test_invalid_reload_leaves_behavior_unchanged() {
    let file = temp_policy(INITIAL);
    let router = router_for(&file);

    let before = mitigate(&router, "kill the process").await;
    assert_eq!(before["action"], "block");

    // Corrupt the document on disk; reload is rejected.
    std::fs::write(file.path(), "banned_keywords: [kill]\nmax_prompt_chars: 0\n").unwrap();
    assert_eq!(post_reload(&router).await, StatusCode::BAD_REQUEST);

    // Same verdicts for the same inputs as pre-reload.
    let after = mitigate(&router, "kill the process").await;
    assert_eq!(after["action"], "block");
    assert_eq!(after["reason"], before["reason"]);

    let allowed = mitigate(&router, "Hello world").await;
    assert_eq!(allowed["action"], "allow");
}

#[tokio::test]
async fn test_successful_reload_switches_rules() {
    let file = temp_policy(INITIAL);
    let router = router_for(&file);

    assert_eq!(mitigate(&router, "deploy the fix").await["action"], "allow");

    std::fs::write(
        file.path(),
        "banned_keywords: [deploy]\nmax_prompt_chars: 100\n",
    )
    .unwrap();
    assert_eq!(post_reload(&router).await, StatusCode::OK);

    let verdict = mitigate(&router, "deploy the fix").await;
    assert_eq!(verdict["action"], "block");
    assert!(verdict["reason"].as_str().unwrap().contains("deploy"));

    // Previously blocked term is no longer banned.
    assert_eq!(mitigate(&router, "kill the process").await["action"], "allow");
}
