use reqwest::{header::CONTENT_TYPE, Client, Response, Url};
use serde_json::Value;
use tracing::debug;

use super::{BackendRequest, ForwardedHeaders};
use crate::errors::{BackendError, ErrorKind};

/// What authenticates a single attempt.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Credential<'a> {
    Bearer(&'a str),
    Forwarded(&'a ForwardedHeaders),
    /// Cookie jar only (refresh calls, public endpoints).
    None,
}

/// One HTTP exchange with the backend: no retries, no token mutation.
#[derive(Clone)]
pub(crate) struct Transport {
    http: Client,
    base_url: Url,
}

impl Transport {
    pub(crate) fn new(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Runs one attempt, racing it against the request's cancellation token.
    /// Dropping the in-flight exchange aborts the underlying connection.
    pub(crate) async fn execute(
        &self,
        request: &BackendRequest,
        credential: Credential<'_>,
    ) -> Result<Option<Value>, BackendError> {
        let exchange = self.exchange(request, credential);
        match &request.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(BackendError::cancelled()),
                result = exchange => result,
            },
            None => exchange.await,
        }
    }

    async fn exchange(
        &self,
        request: &BackendRequest,
        credential: Credential<'_>,
    ) -> Result<Option<Value>, BackendError> {
        let url = self.base_url.join(&request.path).map_err(|e| {
            BackendError::new(
                ErrorKind::BadRequest,
                format!("Invalid backend path '{}': {e}", request.path),
            )
        })?;

        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        match credential {
            Credential::Bearer(token) => builder = builder.bearer_auth(token),
            Credential::Forwarded(headers) => {
                if let Some(authorization) = &headers.authorization {
                    builder = builder.header("authorization", authorization.as_str());
                }
                if let Some(cookie) = &headers.cookie {
                    builder = builder.header("cookie", cookie.as_str());
                }
            }
            Credential::None => {}
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("{} {}", request.method, request.path);
        let response = builder.send().await.map_err(BackendError::network)?;
        read_response(response).await
    }
}

/// JSON is parsed only when the backend says it is JSON; an unparseable JSON
/// body is treated as no body.
async fn read_response(response: Response) -> Result<Option<Value>, BackendError> {
    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let payload = if is_json {
        response.json::<Value>().await.ok()
    } else {
        None
    };

    if !status.is_success() {
        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .or_else(|| status.canonical_reason());
        debug!("backend answered {status}: {message:?}");
        return Err(BackendError::from_response(status.as_u16(), message));
    }

    Ok(payload)
}
