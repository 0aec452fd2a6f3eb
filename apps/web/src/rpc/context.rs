//! Per-call context for procedures: who is calling, from where, in which locale.

use std::convert::Infallible;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
};
use reqwest::Url;
use tracing::debug;

use crate::auth_client::PROFILE_PATH;
use crate::backend::{BackendClient, BackendRequest, ExecutionMode, ForwardedHeaders};
use crate::session::{ProfileEnvelope, Session};

/// Marks a call as issued by trusted in-process code.
pub const SERVER_SIDE_CALL_HEADER: &str = "x-server-side-call";
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    /// `locale` cookie, else the first `Accept-Language` tag, else `en-US`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let from_cookie = headers
            .get_all("cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == "locale")
            .map(|(_, value)| value.trim().to_string());

        let from_accept = || {
            headers
                .get("accept-language")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(|tag| tag.split(';').next().unwrap_or(tag).trim().to_string())
        };

        let tag = from_cookie
            .or_else(from_accept)
            .filter(|tag| !tag.is_empty() && tag != "*")
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        Locale(tag)
    }
}

/// A procedure invocation before its caller has been identified.
#[derive(Debug, Clone)]
pub struct InboundCall {
    pub locale: Locale,
    pub headers: HeaderMap,
}

impl InboundCall {
    /// A call that arrived over the network. The trust marker is never
    /// accepted from a network client.
    pub fn from_network(headers: &HeaderMap) -> Self {
        let mut headers = headers.clone();
        headers.remove(SERVER_SIDE_CALL_HEADER);
        Self {
            locale: Locale::from_headers(&headers),
            headers,
        }
    }

    /// A call made by trusted server code on behalf of an inbound request.
    pub(crate) fn from_server(request_headers: &HeaderMap) -> Self {
        let mut headers = request_headers.clone();
        headers.insert(SERVER_SIDE_CALL_HEADER, HeaderValue::from_static("true"));
        Self {
            locale: Locale::from_headers(&headers),
            headers,
        }
    }

    pub fn is_server_side_call(&self) -> bool {
        self.headers
            .get(SERVER_SIDE_CALL_HEADER)
            .is_some_and(|v| v == "true")
    }

    pub fn forwarded(&self) -> ForwardedHeaders {
        ForwardedHeaders::from_headers(&self.headers)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for InboundCall
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(InboundCall::from_network(&parts.headers))
    }
}

/// Context handed to procedure handlers once the access policy has admitted the call.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub locale: Locale,
    pub headers: HeaderMap,
    pub user: Option<Session>,
    pub server_side_call: bool,
}

impl CallContext {
    pub fn forwarded(&self) -> ForwardedHeaders {
        ForwardedHeaders::from_headers(&self.headers)
    }
}

/// Identifies the caller behind a set of forwarded headers.
///
/// Never fails: every problem degrades to "anonymous".
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &ForwardedHeaders) -> Option<Session>;
}

/// Resolves callers by asking the backend's profile endpoint.
pub struct ProfileResolver {
    backend: BackendClient,
}

impl ProfileResolver {
    pub fn new(backend_url: Url) -> Result<Self> {
        Ok(Self {
            backend: BackendClient::new(backend_url, ExecutionMode::Server)?,
        })
    }
}

#[async_trait]
impl SessionResolver for ProfileResolver {
    async fn resolve(&self, headers: &ForwardedHeaders) -> Option<Session> {
        // Anonymous callers cost no backend round-trip.
        if headers.is_empty() {
            return None;
        }

        let request = BackendRequest::get(PROFILE_PATH).forwarding(headers);
        match self.backend.request_json::<ProfileEnvelope>(&request).await {
            Ok(envelope) => envelope.data,
            Err(e) => {
                debug!("caller resolved as anonymous: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    use super::*;
    use crate::session::Role;
    use crate::testutil::{spawn_backend, RequestLog};

    fn profile_router(log: RequestLog) -> Router {
        Router::new()
            .route(
                PROFILE_PATH,
                get(|State(log): State<RequestLog>, headers: HeaderMap| async move {
                    log.record(&headers);
                    Json(json!({
                        "success": true,
                        "data": {
                            "userId": "u-1",
                            "email": "ada@example.com",
                            "role": "candidate",
                            "isEmailVerified": true,
                            "is2FAEnabled": false
                        }
                    }))
                }),
            )
            .with_state(log)
    }

    #[tokio::test]
    async fn test_no_credentials_means_no_lookup() {
        let log = RequestLog::default();
        let base = spawn_backend(profile_router(log.clone())).await;
        let resolver = ProfileResolver::new(base).unwrap();

        let user = resolver.resolve(&ForwardedHeaders::default()).await;

        assert!(user.is_none());
        assert_eq!(log.hits(), 0);
    }

    #[tokio::test]
    async fn test_resolves_with_only_forwarded_credentials() {
        let log = RequestLog::default();
        let base = spawn_backend(profile_router(log.clone())).await;
        let resolver = ProfileResolver::new(base).unwrap();

        let mut inbound = HeaderMap::new();
        inbound.insert("cookie", HeaderValue::from_static("sid=abc"));
        inbound.insert("x-request-id", HeaderValue::from_static("req-1"));
        let call = InboundCall::from_network(&inbound);

        let user = resolver.resolve(&call.forwarded()).await.unwrap();

        assert_eq!(user.user_id, "u-1");
        assert_eq!(user.role, Role::Candidate);
        assert_eq!(log.hits(), 1);
        let seen = log.last();
        assert_eq!(seen.cookie.as_deref(), Some("sid=abc"));
        assert!(seen.authorization.is_none());
    }

    #[tokio::test]
    async fn test_failed_lookups_degrade_to_anonymous() {
        let headers = ForwardedHeaders {
            authorization: Some("Bearer tok".to_string()),
            cookie: None,
        };

        let rejected = spawn_backend(Router::new().route(
            PROFILE_PATH,
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({ "message": "expired" }))) }),
        ))
        .await;
        let resolver = ProfileResolver::new(rejected).unwrap();
        assert!(resolver.resolve(&headers).await.is_none());

        let malformed = spawn_backend(Router::new().route(
            PROFILE_PATH,
            get(|| async { Json(json!({ "success": true, "data": 42 })) }),
        ))
        .await;
        let resolver = ProfileResolver::new(malformed).unwrap();
        assert!(resolver.resolve(&headers).await.is_none());

        let resolver = ProfileResolver::new(Url::parse("http://127.0.0.1:1").unwrap()).unwrap();
        assert!(resolver.resolve(&headers).await.is_none());
    }

    #[test]
    fn test_network_calls_cannot_claim_server_trust() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER_SIDE_CALL_HEADER, HeaderValue::from_static("true"));

        assert!(!InboundCall::from_network(&headers).is_server_side_call());
        assert!(InboundCall::from_server(&HeaderMap::new()).is_server_side_call());
    }

    #[test]
    fn test_locale_resolution_order() {
        let mut headers = HeaderMap::new();
        assert_eq!(Locale::from_headers(&headers).0, "en-US");

        headers.insert(
            "accept-language",
            HeaderValue::from_static("de-DE;q=0.9, en;q=0.8"),
        );
        assert_eq!(Locale::from_headers(&headers).0, "de-DE");

        headers.insert("cookie", HeaderValue::from_static("sid=1; locale=fr-FR"));
        assert_eq!(Locale::from_headers(&headers).0, "fr-FR");
    }
}
