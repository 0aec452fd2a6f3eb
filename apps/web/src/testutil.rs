//! Shared helpers for tests: a throwaway backend on a random local port and
//! recorders for what it saw.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::any, Json, Router};
use parking_lot::Mutex;
use reqwest::Url;
use serde_json::{json, Value};

use crate::session::Navigator;

/// Serves `router` on 127.0.0.1 and returns its base URL.
pub async fn spawn_backend(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct SeenRequest {
    pub authorization: Option<String>,
    pub cookie: Option<String>,
    pub server_side_call: Option<String>,
}

/// Counts hits and keeps the credential headers of every request.
#[derive(Clone, Default)]
pub struct RequestLog {
    pub count: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl RequestLog {
    pub fn record(&self, headers: &HeaderMap) {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.count.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(SeenRequest {
            authorization: read("authorization"),
            cookie: read("cookie"),
            server_side_call: read("x-server-side-call"),
        });
    }

    pub fn last(&self) -> SeenRequest {
        self.seen.lock().last().cloned().unwrap_or_default()
    }

    pub fn hits(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Any method on `path` is recorded and answered with `{ "data": {} }`.
    pub fn echo_router(&self, path: &str) -> Router {
        Router::new()
            .route(path, any(echo))
            .with_state(self.clone())
    }
}

async fn echo(State(log): State<RequestLog>, headers: HeaderMap) -> Json<Value> {
    log.record(&headers);
    Json(json!({ "data": {} }))
}

/// Remembers every redirect instead of performing it.
#[derive(Default)]
pub struct RecordingNavigator {
    locations: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn locations(&self) -> Vec<String> {
        self.locations.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, location: &str) {
        self.locations.lock().push(location.to_string());
    }
}
