//! Upstream OCS API client.
//!
//! Thin async client for the third-party OCS query endpoint. The upstream
//! speaks a single-URL protocol: every operation is a POST to the same
//! endpoint with the operation name as the top-level key of the JSON body
//! and the access token as a `token` query parameter. All operations go
//! through one shared helper on one pooled connection, so every call
//! carries the same bounded timeout and the same non-JSON fallback.

use std::fmt;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::OcsConfig;
use crate::error::OcsError;

/// A parsed upstream response body.
///
/// The upstream occasionally answers with something that is not JSON
/// (HTML error pages, plain text). That degrades into [`UpstreamBody::Raw`]
/// instead of an error, so callers can tell "upstream spoke non-JSON"
/// apart from a transport failure.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    Raw(String),
}

impl UpstreamBody {
    fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => UpstreamBody::Json(value),
            Err(_) => UpstreamBody::Raw(text),
        }
    }

    /// The wire form handed to consumers: raw text is wrapped under a
    /// sentinel `raw` key.
    pub fn into_value(self) -> Value {
        match self {
            UpstreamBody::Json(value) => value,
            UpstreamBody::Raw(text) => json!({ "raw": text }),
        }
    }
}

/// Validate an inbound account id.
///
/// Accepts a JSON integer or an integral numeric string. Anything else is
/// rejected with [`OcsError::InvalidAccountId`] rather than silently
/// replaced by some default account.
pub fn parse_account_id(value: Option<&Value>) -> Result<i64, OcsError> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| OcsError::InvalidAccountId(n.to_string())),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| OcsError::InvalidAccountId(s.clone())),
        Some(other) => Err(OcsError::InvalidAccountId(other.to_string())),
        None => Err(OcsError::InvalidAccountId("missing".to_string())),
    }
}

/// Async client for the upstream OCS API.
pub struct OcsClient {
    http: Client,
    api_url: String,
    api_token: String,
    timeout_secs: u64,
}

impl OcsClient {
    /// Build a client from configuration. One `reqwest::Client` with one
    /// uniform timeout backs every operation.
    pub fn new(config: &OcsConfig) -> Result<Self, OcsError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OcsError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Fetch the weekly per-package report for one account.
    pub async fn fetch_report(
        &self,
        account_id: i64,
        start_date: &str,
    ) -> Result<UpstreamBody, OcsError> {
        let body = json!({
            "reportByPackageWeekly": {
                "accountId": account_id,
                "startDate": start_date,
            }
        });
        debug!(account_id, start_date, "fetching weekly report");
        self.post_query(&body).await
    }

    /// Fetch the subscriber list for one account.
    pub async fn fetch_subscriber_list(&self, account_id: i64) -> Result<UpstreamBody, OcsError> {
        let body = json!({ "listSubscriber": { "accountId": account_id } });
        debug!(account_id, "fetching subscriber list");
        self.post_query(&body).await
    }

    /// Shared POST helper. Every outbound call goes through here so the
    /// timeout and the non-JSON fallback cannot drift between operations.
    ///
    /// Upstream reports application errors inside 200 bodies and has been
    /// seen doing the reverse, so the HTTP status is logged but the body is
    /// parsed and returned regardless.
    async fn post_query(&self, body: &Value) -> Result<UpstreamBody, OcsError> {
        // Token goes in the query string; upstream accepts it nowhere
        // else. Never log this URL.
        let url = format!("{}?token={}", self.api_url, self.api_token);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            warn!(%status, "upstream returned non-success status, passing body through");
        }
        Ok(UpstreamBody::from_text(text))
    }

    fn classify(&self, err: reqwest::Error) -> OcsError {
        OcsError::from_reqwest(err, self.timeout_secs)
    }
}

impl fmt::Debug for OcsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcsClient")
            .field("api_url", &self.api_url)
            .field("api_token", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn test_config(base_url: &str, timeout_secs: u64) -> OcsConfig {
        OcsConfig {
            api_url: base_url.to_string(),
            api_token: "test-token".to_string(),
            timeout_secs,
            default_start_date: "2025-06-01".to_string(),
        }
    }

    #[test]
    fn test_parse_account_id() {
        assert_eq!(parse_account_id(Some(&json!(3771))).unwrap(), 3771);
        assert_eq!(parse_account_id(Some(&json!("3771"))).unwrap(), 3771);
        assert_eq!(parse_account_id(Some(&json!(" 42 "))).unwrap(), 42);

        for bad in [json!("abc"), json!(12.5), json!(null), json!([1])] {
            let err = parse_account_id(Some(&bad)).unwrap_err();
            assert!(matches!(err, OcsError::InvalidAccountId(_)), "{bad:?}");
        }
        assert!(parse_account_id(None).is_err());
    }

    #[tokio::test]
    async fn test_fetch_report_sends_expected_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .query_param("token", "test-token")
                    .json_body(json!({
                        "reportByPackageWeekly": {
                            "accountId": 3771,
                            "startDate": "2025-06-01",
                        }
                    }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({"columns": [], "rows": []}));
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 5)).unwrap();
        let body = client.fetch_report(3771, "2025-06-01").await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, UpstreamBody::Json(json!({"columns": [], "rows": []})));
    }

    #[tokio::test]
    async fn test_fetch_subscriber_list_sends_expected_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .query_param("token", "test-token")
                    .json_body(json!({"listSubscriber": {"accountId": 42}}));
                then.status(200)
                    .json_body(json!({"listSubscriber": {"subscriberList": []}}));
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 5)).unwrap();
        client.fetch_subscriber_list(42).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_json_body_degrades_to_raw() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).body("not json");
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 5)).unwrap();
        let body = client.fetch_report(1, "2025-06-01").await.unwrap();

        assert_eq!(body, UpstreamBody::Raw("not json".to_string()));
        assert_eq!(body.into_value(), json!({"raw": "not json"}));
    }

    #[tokio::test]
    async fn test_non_success_status_still_returns_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(500).json_body(json!({"error": "backend busy"}));
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 5)).unwrap();
        let body = client.fetch_report(1, "2025-06-01").await.unwrap();

        assert_eq!(body, UpstreamBody::Json(json!({"error": "backend busy"})));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .json_body(json!({}))
                    .delay(Duration::from_millis(2500));
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 1)).unwrap();
        let err = client.fetch_report(1, "2025-06-01").await.unwrap_err();

        assert!(matches!(err, OcsError::Timeout { timeout_secs: 1 }));
        assert_eq!(err.to_string(), "upstream request timed out after 1s");
    }

    #[tokio::test]
    async fn test_subscriber_list_honors_same_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200)
                    .json_body(json!({}))
                    .delay(Duration::from_millis(2500));
            })
            .await;

        let client = OcsClient::new(&test_config(&server.base_url(), 1)).unwrap();
        let err = client.fetch_subscriber_list(1).await.unwrap_err();

        assert!(matches!(err, OcsError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_message_omits_token() {
        // Unreachable upstream. reqwest's own message embeds the request
        // URL, which carries the token as a query parameter; the classified
        // error must not echo it anywhere.
        let client = OcsClient::new(&test_config("http://127.0.0.1:9", 1)).unwrap();
        let err = client.fetch_report(1, "2025-06-01").await.unwrap_err();

        assert!(matches!(err, OcsError::Transport(_)));
        let message = err.to_string();
        assert!(message.starts_with("upstream request failed"), "{message}");
        assert!(!message.contains("test-token"), "{message}");
        assert!(!message.contains("token="), "{message}");
        let debug = format!("{err:?}");
        assert!(!debug.contains("test-token"), "{debug}");
    }

    #[test]
    fn test_client_debug_redacts_token() {
        let client = OcsClient::new(&test_config("http://localhost:9", 5)).unwrap();
        let dump = format!("{client:?}");
        assert!(!dump.contains("test-token"));
        assert!(dump.contains("<redacted>"));
    }
}
