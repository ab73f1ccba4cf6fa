//! `reqwest` client for the conversation endpoints.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{debug, warn};

use findernate_shared::constants::{DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS};
use findernate_shared::ConversationSummary;

use crate::envelope;
use crate::error::ApiError;
use crate::source::ConversationSource;

const PATH_CONVERSATIONS: &str = "chats";
const PATH_PENDING_REQUESTS: &str = "chats/requests";

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://api.findernate.com/api/v1`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

/// Authenticated client for the FinderNate REST backend.
///
/// Cloning is cheap; clones share the HTTP connection pool and the token.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(config.base_url));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("findernate-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the bearer token (`None` after logout).
    pub fn set_token(&self, token: Option<String>) {
        match self.token.write() {
            Ok(mut guard) => *guard = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn current_token(&self) -> Option<String> {
        match self.token.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_list(&self, path: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        let token = self.current_token().ok_or(ApiError::Unauthenticated)?;
        let url = self.url(path);

        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!(url = %url, status = %status, "Backend returned an error status");
            return Err(ApiError::Status { status, body });
        }

        let list: Vec<ConversationSummary> = envelope::decode(&body)?;
        debug!(url = %url, count = list.len(), "Fetched conversation list");
        Ok(list)
    }
}

#[async_trait]
impl ConversationSource for ApiClient {
    async fn fetch_conversation_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.get_list(PATH_CONVERSATIONS).await
    }

    async fn fetch_pending_request_list(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.get_list(PATH_PENDING_REQUESTS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn spawn_backend() -> String {
        async fn chats(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer secret");
            if !authorized {
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"success": false, "message": "bad token"})),
                );
            }
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "data": [
                        {"_id": "c1", "chatType": "direct", "unreadCount": 2,
                         "participants": [{"_id": "a"}, {"_id": "b"}], "createdBy": "b"},
                        {"_id": "g1", "chatType": "group", "unreadCount": 7}
                    ]
                })),
            )
        }

        async fn requests() -> (StatusCode, &'static str) {
            (StatusCode::INTERNAL_SERVER_ERROR, "boom")
        }

        let app = Router::new()
            .route("/api/v1/chats", get(chats))
            .route("/api/v1/chats/requests", get(requests));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/api/v1/")
    }

    fn client(base_url: String) -> ApiClient {
        ApiClient::new(ApiConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let result = ApiClient::new(ApiConfig {
            base_url: "ftp://example.com".into(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_requires_token() {
        let api = client("http://127.0.0.1:9".into());
        let err = api.fetch_conversation_list().await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_fetches_conversation_list() {
        let api = client(spawn_backend().await);
        api.set_token(Some("secret".into()));

        let list = api.fetch_conversation_list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].unread_count, Some(2));
        assert_eq!(list[1].id.as_str(), "g1");
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let api = client(spawn_backend().await);
        api.set_token(Some("wrong".into()));

        let err = api.fetch_conversation_list().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::UNAUTHORIZED));
        assert!(!err.is_transient());

        api.set_token(Some("secret".into()));
        let err = api.fetch_pending_request_list().await.unwrap_err();
        assert!(err.is_transient());
    }
}
