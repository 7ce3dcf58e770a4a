//! Inbound HTTP surface.
//!
//! Two POST operations back the dashboard UI, mirroring its fetch calls:
//! `/api/ocs/report` returns the derived weekly report (records plus
//! totals, not the raw upstream body) and `/api/ocs/list-subscribers`
//! returns the subscriber list with headline KPIs. Upstream timeouts map
//! to 504 so callers can tell a slow upstream from a broken one; invalid
//! input maps to 400 before any upstream call is made.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::client::{parse_account_id, OcsClient, UpstreamBody};
use crate::config::OcsConfig;
use crate::error::OcsError;
use crate::report::derive_report;
use crate::subscribers;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<OcsClient>,
    pub default_start_date: String,
}

impl AppState {
    pub fn new(client: Arc<OcsClient>, config: &OcsConfig) -> Self {
        Self {
            client,
            default_start_date: config.default_start_date.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Kept untyped here so validation, not deserialization, decides what
    /// an acceptable account id is.
    pub account_id: Option<Value>,
    pub start_date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub account_id: Option<Value>,
}

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ocs/report", post(report))
        .route("/api/ocs/list-subscribers", post(list_subscribers))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "ocs-dashboard",
    }))
}

/// POST /api/ocs/report
///
/// Body: `{"accountId": <int>, "startDate": "YYYY-MM-DD"?}`. A missing or
/// empty start date falls back to the configured default window.
async fn report(State(state): State<AppState>, Json(request): Json<ReportRequest>) -> Response {
    let account_id = match parse_account_id(request.account_id.as_ref()) {
        Ok(id) => id,
        Err(err) => return error_response(&err),
    };
    let start_date = request
        .start_date
        .filter(|date| !date.is_empty())
        .unwrap_or_else(|| state.default_start_date.clone());

    match state.client.fetch_report(account_id, &start_date).await {
        Ok(UpstreamBody::Json(value)) => {
            let report = derive_report(&value);
            info!(account_id, rows = report.rows.len(), "derived weekly report");
            (StatusCode::OK, Json(report)).into_response()
        }
        Ok(raw @ UpstreamBody::Raw(_)) => (StatusCode::OK, Json(raw.into_value())).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST /api/ocs/list-subscribers
///
/// Body: `{"accountId": <int>}`.
async fn list_subscribers(
    State(state): State<AppState>,
    Json(request): Json<ListRequest>,
) -> Response {
    let account_id = match parse_account_id(request.account_id.as_ref()) {
        Ok(id) => id,
        Err(err) => return error_response(&err),
    };

    match state.client.fetch_subscriber_list(account_id).await {
        Ok(UpstreamBody::Json(value)) => {
            let kpis = subscribers::kpis(&value);
            let list = subscribers::subscriber_list(&value)
                .cloned()
                .unwrap_or_default();
            (
                StatusCode::OK,
                Json(json!({ "kpis": kpis, "subscribers": list })),
            )
                .into_response()
        }
        Ok(raw @ UpstreamBody::Raw(_)) => (StatusCode::OK, Json(raw.into_value())).into_response(),
        Err(err) => error_response(&err),
    }
}

/// Map an error to the boundary contract: 504 for upstream timeouts, 400
/// for rejected input, 500 for everything else, always with an `error`
/// body.
fn error_response(err: &OcsError) -> Response {
    let status = match err {
        OcsError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        OcsError::InvalidAccountId(_) => StatusCode::BAD_REQUEST,
        OcsError::Transport(_) | OcsError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("request failed: {}", err);
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    // State whose upstream is unreachable; only routes that never reach
    // the upstream use this.
    fn offline_state() -> AppState {
        let config = OcsConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_token: "test-token".to_string(),
            timeout_secs: 1,
            default_start_date: "2025-06-01".to_string(),
        };
        let client = OcsClient::new(&config).unwrap();
        AppState::new(Arc::new(client), &config)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(offline_state());
        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_report_rejects_non_numeric_account_id() {
        let app = create_router(offline_state());
        let response = app
            .oneshot(post_json("/api/ocs/report", r#"{"accountId": "abc"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]
            .as_str()
            .unwrap()
            .contains("invalid accountId"));
    }

    #[tokio::test]
    async fn test_report_rejects_missing_account_id() {
        let app = create_router(offline_state());
        let response = app
            .oneshot(post_json("/api/ocs/report", r#"{"startDate": "2025-06-01"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_rejects_fractional_account_id() {
        let app = create_router(offline_state());
        let response = app
            .oneshot(post_json("/api/ocs/list-subscribers", r#"{"accountId": 37.5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_500_not_504() {
        let app = create_router(offline_state());
        let response = app
            .oneshot(post_json("/api/ocs/report", r#"{"accountId": 1}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("upstream request failed"), "{message}");
        // The error body goes to callers; it must not echo the request
        // URL with its token query parameter.
        assert!(!message.contains("test-token"), "{message}");
        assert!(!message.contains("token="), "{message}");
    }
}
