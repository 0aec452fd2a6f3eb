//! Account and feature-flag procedures.

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;

use super::service::ProviderList;
use crate::config::FeatureFlags;
use crate::errors::AppError;
use crate::resume::validation::validate_id;
use crate::rpc::{parse_input, InboundCall, Procedure};
use crate::state::AppState;

pub const PROVIDERS_LIST: Procedure = Procedure::public("auth/providers/list");
pub const VERIFY_RESUME_PASSWORD: Procedure = Procedure::public("auth/verifyResumePassword");
pub const DELETE_ACCOUNT: Procedure = Procedure::authenticated("auth/deleteAccount");
pub const FLAGS: Procedure = Procedure::public("flags");

#[derive(Debug, Deserialize)]
pub struct VerifyPasswordInput {
    pub id: String,
    pub password: String,
}

/// POST /api/rpc/auth/providers/list
pub async fn handle_list_providers(
    State(state): State<AppState>,
    inbound: InboundCall,
) -> Result<Json<ProviderList>, AppError> {
    state.policy.admit(&PROVIDERS_LIST, inbound).await?;
    Ok(Json(state.accounts.providers()))
}

/// POST /api/rpc/auth/verifyResumePassword
pub async fn handle_verify_resume_password(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<bool>, AppError> {
    state.policy.admit(&VERIFY_RESUME_PASSWORD, inbound).await?;
    let input: VerifyPasswordInput = parse_input(&VERIFY_RESUME_PASSWORD, &body)?;
    validate_id(&input.id)?;
    if input.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let verified = state
        .accounts
        .verify_resume_password(&input.id, &input.password)
        .await?;
    Ok(Json(verified))
}

/// POST /api/rpc/auth/deleteAccount
pub async fn handle_delete_account(
    State(state): State<AppState>,
    inbound: InboundCall,
) -> Result<Json<()>, AppError> {
    state.policy.admit(&DELETE_ACCOUNT, inbound).await?;
    state.accounts.delete_account().await?;
    Ok(Json(()))
}

/// POST /api/rpc/flags
pub async fn handle_flags(
    State(state): State<AppState>,
    inbound: InboundCall,
) -> Result<Json<FeatureFlags>, AppError> {
    state.policy.admit(&FLAGS, inbound).await?;
    Ok(Json(state.config.flags))
}
