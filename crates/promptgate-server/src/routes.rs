//! HTTP routes and handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::UNIX_EPOCH;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::debug;

use crate::state::AppState;

/// Request bodies above this are rejected before deserialization
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/mitigate", post(mitigate))
        .route("/history", get(history))
        .route("/reload", post(reload))
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Mitigation request. `prompt` and `user_id` are mandatory; the optional
/// fields are accepted and echoed so callers can correlate.
#[derive(Debug, Deserialize)]
struct MitigateRequest {
    prompt: Option<String>,
    user_id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    purpose: Option<String>,
}

#[derive(Debug, Serialize)]
struct MitigateResponse {
    request_id: String,
    action: promptgate_core::Action,
    prompt_out: String,
    reason: String,
    model: String,
    purpose: String,
}

async fn mitigate(
    State(state): State<AppState>,
    Json(req): Json<MitigateRequest>,
) -> Result<Json<MitigateResponse>, AppError> {
    let prompt = req
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("missing required field: prompt".to_string()))?;
    let user_id = req
        .user_id
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("missing required field: user_id".to_string()))?;

    debug!(user_id = %user_id, "received mitigation request");

    let verdict = state.decide("http", &user_id, &prompt).await;

    Ok(Json(MitigateResponse {
        request_id: format!("req_{}", uuid::Uuid::new_v4()),
        action: verdict.action,
        prompt_out: verdict.prompt_out,
        reason: verdict.reason,
        model: req.model.unwrap_or_else(|| "gpt-4o".to_string()),
        purpose: req.purpose.unwrap_or_else(|| "general".to_string()),
    }))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    #[serde(default)]
    n: Option<i64>,
}

#[derive(Debug, Serialize)]
struct HistoryRecord {
    timestamp_ms: u64,
    user_id: String,
    prompt_in: String,
    action: promptgate_core::Action,
    reason: String,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    count: usize,
    records: Vec<HistoryRecord>,
}

/// Read-only view of the audit tail, chronological order, most recent last
async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    // Nonpositive or missing n falls back to the log's default window.
    let n = params.n.unwrap_or(0).max(0) as usize;

    let records: Vec<HistoryRecord> = state
        .audit
        .tail(n)
        .into_iter()
        .map(|r| HistoryRecord {
            timestamp_ms: r
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            user_id: r.user_id,
            prompt_in: r.prompt_in,
            action: r.action,
            reason: r.reason,
        })
        .collect();

    Json(HistoryResponse {
        count: records.len(),
        records,
    })
}

/// Swap in a fresh policy document; a rejected document leaves the running
/// policy untouched.
async fn reload(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    match state.reload_policy() {
        Ok(()) => Ok(Json(json!({ "status": "reloaded" }))),
        Err(e) => Err(AppError::PolicyRejected(e.to_string())),
    }
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    PolicyRejected(String),
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PolicyRejected(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = json!({
            "error": {
                "message": message,
            }
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use promptgate_filters::SimilarityGuard;
    use promptgate_policy::{PolicyConfig, PolicyEngine, PolicyStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    const POLICY: &str = r#"
banned_keywords: [kill]
max_prompt_chars: 100
redaction_rules:
  redact_emails: true
  redact_phone_numbers: true
  redact_secrets: true
  redact_credit_cards: true
"#;

    fn test_router() -> Router {
        let config = PolicyConfig::from_yaml(POLICY).unwrap();
        let store = Arc::new(PolicyStore::from_config(config).unwrap());
        let engine = Arc::new(PolicyEngine::new(store, SimilarityGuard::disabled()));
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        create_router(AppState::new(engine, handle))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_mitigate_allow() {
        let response = test_router()
            .oneshot(post_json(
                "/mitigate",
                json!({"prompt": "Hello world", "user_id": "u1"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["action"], "allow");
        assert_eq!(body["prompt_out"], "Hello world");
        assert_eq!(body["model"], "gpt-4o");
    }

    #[tokio::test]
    async fn test_mitigate_block_keeps_original_prompt() {
        let response = test_router()
            .oneshot(post_json(
                "/mitigate",
                json!({"prompt": "kill the session", "user_id": "u1"}),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["action"], "block");
        assert_eq!(body["prompt_out"], "kill the session");
        assert!(body["reason"].as_str().unwrap().contains("kill"));
    }

    #[tokio::test]
    async fn test_mitigate_redacts_email() {
        let response = test_router()
            .oneshot(post_json(
                "/mitigate",
                json!({"prompt": "mail a@b.com", "user_id": "u1"}),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["action"], "redact");
        assert_eq!(body["prompt_out"], "mail <EMAIL>");
    }

    #[tokio::test]
    async fn test_mitigate_missing_fields_is_400() {
        let response = test_router()
            .oneshot(post_json("/mitigate", json!({"prompt": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_returns_recent_decisions() {
        let router = test_router();

        let _ = router
            .clone()
            .oneshot(post_json(
                "/mitigate",
                json!({"prompt": "Hello world", "user_id": "u1"}),
            ))
            .await
            .unwrap();
        let _ = router
            .clone()
            .oneshot(post_json(
                "/mitigate",
                json!({"prompt": "kill it", "user_id": "u2"}),
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/history?n=10")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        // Chronological order, most recent last.
        assert_eq!(body["records"][0]["user_id"], "u1");
        assert_eq!(body["records"][1]["action"], "block");
    }

    #[tokio::test]
    async fn test_reload_without_file_backed_store_is_400() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
