pub mod health;
pub mod pages;
pub mod printer;

use axum::{
    http::StatusCode,
    routing::{any, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::account::handlers as account;
use crate::resume::handlers as resume;
use crate::rpc::Procedure;
use crate::state::AppState;

/// Authentication lives entirely in the backend; nothing is served here.
async fn auth_handled_elsewhere() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "message": "Authentication is handled by the backend service."
        })),
    )
}

pub fn build_router(state: AppState) -> Router {
    let rpc = |procedure: Procedure| procedure.route();

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/*rest", any(auth_handled_elsewhere))
        // Pages
        .route("/auth/:mode", get(pages::handle_auth_page))
        .route("/dashboard", get(pages::handle_dashboard))
        .route("/api/printer/resume", get(printer::handle_printer_resume))
        // Account procedures
        .route(&rpc(account::PROVIDERS_LIST), post(account::handle_list_providers))
        .route(
            &rpc(account::VERIFY_RESUME_PASSWORD),
            post(account::handle_verify_resume_password),
        )
        .route(&rpc(account::DELETE_ACCOUNT), post(account::handle_delete_account))
        .route(&rpc(account::FLAGS), post(account::handle_flags))
        // Resume procedures
        .route(&rpc(resume::TAGS_LIST), post(resume::handle_list_tags))
        .route(
            &rpc(resume::STATISTICS_GET_BY_ID),
            post(resume::handle_get_statistics),
        )
        .route(
            &rpc(resume::STATISTICS_INCREMENT),
            post(resume::handle_increment_statistics),
        )
        .route(&rpc(resume::LIST), post(resume::handle_list))
        .route(&rpc(resume::GET_BY_ID), post(resume::handle_get_by_id))
        .route(
            &rpc(resume::GET_BY_ID_FOR_PRINTER),
            post(resume::handle_get_by_id_for_printer),
        )
        .route(
            &rpc(resume::GET_PUBLIC_BY_ID),
            post(resume::handle_get_public_by_id),
        )
        .route(&rpc(resume::CREATE), post(resume::handle_create))
        .route(&rpc(resume::UPDATE), post(resume::handle_update))
        .route(&rpc(resume::SET_LOCKED), post(resume::handle_set_locked))
        .route(&rpc(resume::SET_PASSWORD), post(resume::handle_set_password))
        .route(
            &rpc(resume::REMOVE_PASSWORD),
            post(resume::handle_remove_password),
        )
        .route(&rpc(resume::DUPLICATE), post(resume::handle_duplicate))
        .route(&rpc(resume::DELETE), post(resume::handle_delete))
        .with_state(state)
}
