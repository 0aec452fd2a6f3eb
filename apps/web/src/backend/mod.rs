//! Backend client: every call to the resume backend goes through here.
//!
//! Flow: BackendRequest → credential selection (bearer token, else forwarded
//! headers) → transport → response classification → (browser mode only)
//! 401 refresh-and-retry.

pub mod refresh;
pub mod transport;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderMap;
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::errors::{BackendError, ErrorKind};
use crate::session::{Navigator, TokenStore};

use refresh::RefreshCoordinator;
use transport::{Credential, Transport};

/// How the client authenticates, fixed at construction.
#[derive(Clone)]
pub enum ExecutionMode {
    /// Browser context: bearer token from the token store, shared cookie jar,
    /// and silent refresh when the backend answers 401.
    Browser {
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    },
    /// Trusted server code acting for an inbound request. No token store and
    /// no cookie jar: credentials come only from the forwarded headers.
    Server,
}

/// The two inbound headers that may be relayed to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
}

impl ForwardedHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            authorization: read("authorization"),
            cookie: read("cookie"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.authorization.is_none() && self.cookie.is_none()
    }
}

/// One logical backend call.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub forwarded: Option<ForwardedHeaders>,
    pub cancel: Option<CancellationToken>,
}

impl BackendRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            forwarded: None,
            cancel: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.push((name.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn forwarding(mut self, headers: &ForwardedHeaders) -> Self {
        self.forwarded = Some(headers.clone());
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Bearer token wins; without one the forwarded headers are relayed.
    fn credential<'a>(&'a self, token: Option<&'a str>) -> Credential<'a> {
        match (token, &self.forwarded) {
            (Some(token), _) => Credential::Bearer(token),
            (None, Some(forwarded)) if !forwarded.is_empty() => Credential::Forwarded(forwarded),
            _ => Credential::None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: Option<T>,
}

#[derive(Clone)]
pub struct BackendClient {
    transport: Transport,
    mode: ExecutionMode,
}

impl BackendClient {
    pub fn new(base_url: Url, mode: ExecutionMode) -> Result<Self> {
        let builder = Client::builder();
        let builder = match &mode {
            ExecutionMode::Browser { .. } => builder.cookie_store(true),
            ExecutionMode::Server => builder,
        };
        let http = builder.build().context("Failed to build backend HTTP client")?;

        Ok(Self {
            transport: Transport::new(http, base_url),
            mode,
        })
    }

    /// Sends the request and returns the JSON payload, if the response had one.
    pub async fn request(&self, request: &BackendRequest) -> Result<Option<Value>, BackendError> {
        match &self.mode {
            ExecutionMode::Browser { tokens, navigator } => {
                RefreshCoordinator::new(tokens.as_ref(), navigator.as_ref())
                    .run(&self.transport, request)
                    .await
            }
            ExecutionMode::Server => {
                self.transport
                    .execute(request, request.credential(None))
                    .await
            }
        }
    }

    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: &BackendRequest,
    ) -> Result<T, BackendError> {
        let payload = self.request(request).await?.ok_or_else(|| {
            BackendError::new(ErrorKind::InternalError, "Backend returned no JSON payload")
        })?;
        serde_json::from_value(payload).map_err(|e| {
            BackendError::new(
                ErrorKind::InternalError,
                format!("Malformed backend response: {e}"),
            )
        })
    }

    /// Unwraps the backend's `{ data }` envelope.
    pub async fn request_data<T: DeserializeOwned>(
        &self,
        request: &BackendRequest,
    ) -> Result<Option<T>, BackendError> {
        let envelope: DataEnvelope<T> = self.request_json(request).await?;
        Ok(envelope.data)
    }
}
