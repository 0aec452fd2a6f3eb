//! Server-side gates for the pages that depend on the caller's session.
//!
//! Sign-in itself happens on the external identity portal; these routes only
//! decide where to send the browser.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::config::Config;
use crate::rpc::InboundCall;
use crate::session::{candidate_auth_url, with_base_path, AuthMode};
use crate::state::AppState;

const DASHBOARD_PATH: &str = "/dashboard";

/// Absolute URL of an application path, honouring the base path.
fn app_link(config: &Config, path: &str) -> String {
    let path = with_base_path(&config.app_base_path, path);
    config
        .app_url
        .join(&path)
        .map(|url| url.to_string())
        .unwrap_or(path)
}

fn to_portal(config: &Config, return_to: &str, mode: AuthMode) -> Response {
    let target = candidate_auth_url(config.portal_url(), Some(return_to), mode);
    Redirect::temporary(target.as_str()).into_response()
}

/// GET /auth/:mode
pub async fn handle_auth_page(
    State(state): State<AppState>,
    Path(mode): Path<String>,
    inbound: InboundCall,
) -> Response {
    let Some(mode) = AuthMode::from_segment(&mode) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let ctx = state.policy.identify(inbound).await;
    if ctx.user.is_some() {
        let dashboard = with_base_path(&state.config.app_base_path, DASHBOARD_PATH);
        return Redirect::temporary(&dashboard).into_response();
    }

    let return_to = app_link(&state.config, &format!("/auth/{mode}"));
    to_portal(&state.config, &return_to, mode)
}

/// GET /dashboard
pub async fn handle_dashboard(State(state): State<AppState>, inbound: InboundCall) -> Response {
    let ctx = state.policy.identify(inbound).await;
    match ctx.user {
        Some(session) => Json(session).into_response(),
        None => {
            let return_to = app_link(&state.config, DASHBOARD_PATH);
            to_portal(&state.config, &return_to, AuthMode::Login)
        }
    }
}
