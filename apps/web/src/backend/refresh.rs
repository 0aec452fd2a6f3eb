//! Silent token refresh for browser-mode clients.
//!
//! Each logical request is either `Initial` or `Retried`. A 401 on the initial
//! attempt triggers one refresh call; on success the request is replayed once
//! with the new token, on failure the session is cleared and the client is
//! sent to the login page. Concurrent 401s each refresh on their own: the
//! backend treats refresh as idempotent and the token store is last-writer-wins.

use serde_json::{json, Value};
use tracing::{debug, warn};

use super::transport::{Credential, Transport};
use super::BackendRequest;
use crate::errors::{BackendError, ErrorKind};
use crate::session::{Navigator, TokenStore, LOGIN_PATH};

pub const REFRESH_PATH: &str = "/api/auth/refresh-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Initial,
    Retried,
}

pub(crate) struct RefreshCoordinator<'a> {
    tokens: &'a dyn TokenStore,
    navigator: &'a dyn Navigator,
}

impl<'a> RefreshCoordinator<'a> {
    pub(crate) fn new(tokens: &'a dyn TokenStore, navigator: &'a dyn Navigator) -> Self {
        Self { tokens, navigator }
    }

    pub(crate) async fn run(
        &self,
        transport: &Transport,
        request: &BackendRequest,
    ) -> Result<Option<Value>, BackendError> {
        let stored = self.tokens.access_token();
        let mut attempt = Attempt::Initial;
        let mut result = transport
            .execute(request, request.credential(stored.as_deref()))
            .await;

        loop {
            let err = match result {
                Err(err) if err.is_unauthorized() => err,
                other => return other,
            };

            if attempt == Attempt::Retried {
                // The replay with a fresh token still ended in 401.
                self.tokens.clear();
                return Err(err);
            }
            if request.is_cancelled() {
                return Err(BackendError::cancelled());
            }

            match self.refresh(transport, request).await {
                Ok(token) => {
                    debug!("access token refreshed, replaying {}", request.path);
                    attempt = Attempt::Retried;
                    result = transport
                        .execute(request, Credential::Bearer(&token))
                        .await;
                }
                Err(refresh_err) if refresh_err.kind == ErrorKind::CancellationRequested => {
                    return Err(refresh_err);
                }
                Err(refresh_err) => {
                    warn!("token refresh failed: {refresh_err}");
                    self.tokens.clear();
                    self.navigator.navigate(LOGIN_PATH);
                    return Err(err);
                }
            }
        }
    }

    /// Exchanges the session cookie for a new access token. The refresh call
    /// carries no bearer header.
    async fn refresh(
        &self,
        transport: &Transport,
        original: &BackendRequest,
    ) -> Result<String, BackendError> {
        let mut request = BackendRequest::post(REFRESH_PATH).json(json!({}));
        request.cancel = original.cancel.clone();

        let payload = transport.execute(&request, Credential::None).await?;
        let token = payload
            .as_ref()
            .and_then(|p| p.pointer("/data/accessToken"))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                BackendError::new(ErrorKind::Unauthorized, "Refresh returned no access token")
            })?;

        self.tokens.set_access_token(token);
        Ok(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use reqwest::Url;

    use super::*;
    use crate::backend::{BackendClient, ExecutionMode};
    use crate::session::MemoryTokenStore;
    use crate::testutil::{spawn_backend, RecordingNavigator};

    /// Fake backend: `/api/resumes` accepts only `valid_token`; refresh hands
    /// out `refresh_token` (or fails when that is `None`).
    #[derive(Clone)]
    struct Backend {
        valid_token: &'static str,
        refresh_token: Option<&'static str>,
        resource_hits: Arc<AtomicUsize>,
        refresh_hits: Arc<AtomicUsize>,
        refresh_saw_bearer: Arc<AtomicUsize>,
    }

    impl Backend {
        fn new(valid_token: &'static str, refresh_token: Option<&'static str>) -> Self {
            Self {
                valid_token,
                refresh_token,
                resource_hits: Arc::default(),
                refresh_hits: Arc::default(),
                refresh_saw_bearer: Arc::default(),
            }
        }

        fn router(&self) -> Router {
            Router::new()
                .route("/api/resumes", get(resource))
                .route(REFRESH_PATH, post(refresh))
                .with_state(self.clone())
        }
    }

    async fn resource(State(backend): State<Backend>, headers: HeaderMap) -> Response {
        backend.resource_hits.fetch_add(1, Ordering::SeqCst);
        let expected = format!("Bearer {}", backend.valid_token);
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some(auth) if auth == expected => Json(json!({ "data": ["r-1"] })).into_response(),
            _ => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Token expired" })),
            )
                .into_response(),
        }
    }

    async fn refresh(State(backend): State<Backend>, headers: HeaderMap) -> Response {
        backend.refresh_hits.fetch_add(1, Ordering::SeqCst);
        if headers.contains_key("authorization") {
            backend.refresh_saw_bearer.fetch_add(1, Ordering::SeqCst);
        }
        match backend.refresh_token {
            Some(token) => Json(json!({ "data": { "accessToken": token } })).into_response(),
            None => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Refresh token missing" })),
            )
                .into_response(),
        }
    }

    fn client(
        base: Url,
        tokens: Arc<MemoryTokenStore>,
        navigator: Arc<RecordingNavigator>,
    ) -> BackendClient {
        BackendClient::new(base, ExecutionMode::Browser { tokens, navigator }).unwrap()
    }

    #[tokio::test]
    async fn test_successful_refresh_retries_exactly_once() {
        let backend = Backend::new("fresh", Some("fresh"));
        let base = spawn_backend(backend.router()).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("stale"));
        let navigator = Arc::new(RecordingNavigator::default());
        let client = client(base, tokens.clone(), navigator.clone());

        let payload = client
            .request(&BackendRequest::get("/api/resumes"))
            .await
            .unwrap();

        assert_eq!(payload, Some(json!({ "data": ["r-1"] })));
        assert_eq!(backend.resource_hits.load(Ordering::SeqCst), 2);
        assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);
        assert_eq!(backend.refresh_saw_bearer.load(Ordering::SeqCst), 0);
        assert_eq!(tokens.access_token().as_deref(), Some("fresh"));
        assert!(navigator.locations().is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session_and_redirects() {
        let backend = Backend::new("fresh", None);
        let base = spawn_backend(backend.router()).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("stale"));
        tokens.set_pending_email("ada@example.com");
        let navigator = Arc::new(RecordingNavigator::default());
        let client = client(base, tokens.clone(), navigator.clone());

        let err = client
            .request(&BackendRequest::get("/api/resumes"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unauthorized);
        assert_eq!(err.message, "Token expired");
        assert_eq!(backend.resource_hits.load(Ordering::SeqCst), 1);
        assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);
        assert!(tokens.access_token().is_none());
        assert!(tokens.pending_email().is_none());
        assert_eq!(navigator.locations(), vec![LOGIN_PATH.to_string()]);
    }

    #[tokio::test]
    async fn test_retried_401_clears_tokens_without_second_refresh() {
        // Refresh succeeds but hands out a token the resource still rejects.
        let backend = Backend::new("other", Some("fresh"));
        let base = spawn_backend(backend.router()).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("stale"));
        let navigator = Arc::new(RecordingNavigator::default());
        let client = client(base, tokens.clone(), navigator.clone());

        let err = client
            .request(&BackendRequest::get("/api/resumes"))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(401));
        assert_eq!(backend.resource_hits.load(Ordering::SeqCst), 2);
        assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 1);
        assert!(tokens.access_token().is_none());
        assert!(navigator.locations().is_empty());
    }

    #[tokio::test]
    async fn test_non_401_errors_skip_refresh() {
        let refresh_hits = Arc::new(AtomicUsize::new(0));
        let hits = refresh_hits.clone();
        let router = Router::new()
            .route(
                "/api/resumes",
                get(|| async { (StatusCode::FORBIDDEN, Json(json!({ "message": "nope" }))) }),
            )
            .route(
                REFRESH_PATH,
                post(move || {
                    hits.fetch_add(1, Ordering::SeqCst);
                    async { Json(json!({ "data": { "accessToken": "x" } })) }
                }),
            );
        let base = spawn_backend(router).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("tok"));
        let client = client(base, tokens.clone(), Arc::new(RecordingNavigator::default()));

        let err = client
            .request(&BackendRequest::get("/api/resumes"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::BadRequest);
        assert_eq!(refresh_hits.load(Ordering::SeqCst), 0);
        assert_eq!(tokens.access_token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn test_cancelled_request_never_refreshes() {
        let backend = Backend::new("fresh", Some("fresh"));
        let base = spawn_backend(backend.router()).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("stale"));
        let navigator = Arc::new(RecordingNavigator::default());
        let client = client(base, tokens.clone(), navigator.clone());

        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let err = client
            .request(&BackendRequest::get("/api/resumes").cancel_on(token))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::CancellationRequested);
        assert_eq!(backend.refresh_hits.load(Ordering::SeqCst), 0);
        assert_eq!(tokens.access_token().as_deref(), Some("stale"));
        assert!(navigator.locations().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_refresh_keeps_session() {
        let token = tokio_util::sync::CancellationToken::new();
        let refresh_hits = Arc::new(AtomicUsize::new(0));
        // The refresh call is in flight when the caller gives up.
        let slow_refresh = {
            let token = token.clone();
            let hits = refresh_hits.clone();
            move || {
                hits.fetch_add(1, Ordering::SeqCst);
                token.cancel();
                async {
                    tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                    Json(json!({ "data": { "accessToken": "fresh" } }))
                }
            }
        };
        let router = Router::new()
            .route(
                "/api/resumes",
                get(|| async {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "message": "Token expired" })),
                    )
                }),
            )
            .route(REFRESH_PATH, post(slow_refresh));
        let base = spawn_backend(router).await;
        let tokens = Arc::new(MemoryTokenStore::with_access_token("stale"));
        tokens.set_pending_email("ada@example.com");
        let navigator = Arc::new(RecordingNavigator::default());
        let client = client(base, tokens.clone(), navigator.clone());

        let err = client
            .request(&BackendRequest::get("/api/resumes").cancel_on(token))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::CancellationRequested);
        assert_eq!(refresh_hits.load(Ordering::SeqCst), 1);
        assert_eq!(tokens.access_token().as_deref(), Some("stale"));
        assert_eq!(tokens.pending_email().as_deref(), Some("ada@example.com"));
        assert!(navigator.locations().is_empty());
    }
}
