//! Resume procedures. Each handler admits the call through the access policy
//! before decoding its input or touching the backend.

use axum::{body::Bytes, extract::State, Json};
use serde::Deserialize;

use super::service::DuplicateOverrides;
use super::validation::{validate_id, validate_label, validate_password};
use crate::errors::AppError;
use crate::models::resume::{
    NewResume, ResumeDetail, ResumePatch, ResumeSort, ResumeStatistics, ResumeSummary,
};
use crate::rpc::{parse_input, parse_optional_input, CallContext, InboundCall, Procedure};
use crate::state::AppState;

pub const TAGS_LIST: Procedure = Procedure::authenticated("resume/tags/list");
pub const STATISTICS_GET_BY_ID: Procedure = Procedure::authenticated("resume/statistics/getById");
pub const STATISTICS_INCREMENT: Procedure = Procedure::public("resume/statistics/increment");
pub const LIST: Procedure = Procedure::authenticated("resume/list");
pub const GET_BY_ID: Procedure = Procedure::authenticated("resume/getById");
pub const GET_BY_ID_FOR_PRINTER: Procedure = Procedure::server_only("resume/getByIdForPrinter");
pub const GET_PUBLIC_BY_ID: Procedure = Procedure::public("resume/getPublicById");
pub const CREATE: Procedure = Procedure::authenticated("resume/create");
pub const UPDATE: Procedure = Procedure::authenticated("resume/update");
pub const SET_LOCKED: Procedure = Procedure::authenticated("resume/setLocked");
pub const SET_PASSWORD: Procedure = Procedure::authenticated("resume/setPassword");
pub const REMOVE_PASSWORD: Procedure = Procedure::authenticated("resume/removePassword");
pub const DUPLICATE: Procedure = Procedure::authenticated("resume/duplicate");
pub const DELETE: Procedure = Procedure::authenticated("resume/delete");

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IdInput {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct IncrementInput {
    pub id: String,
    #[serde(default)]
    pub views: bool,
    #[serde(default)]
    pub downloads: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListInput {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub sort: ResumeSort,
}

#[derive(Debug, Deserialize)]
pub struct CreateInput {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInput {
    pub id: String,
    #[serde(flatten)]
    pub patch: ResumePatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLockedInput {
    pub id: String,
    pub is_locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordInput {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct DuplicateInput {
    pub id: String,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub tags: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared with in-process callers
// ────────────────────────────────────────────────────────────────────────────

/// Loads the owner's copy of a resume for a call already admitted to
/// `GET_BY_ID_FOR_PRINTER`.
pub async fn load_for_printer(
    state: &AppState,
    ctx: &CallContext,
    id: &str,
) -> Result<ResumeDetail, AppError> {
    validate_id(id)?;
    Ok(state.resumes.get_by_id(&ctx.forwarded(), id).await?)
}

pub async fn load_public(state: &AppState, id: &str) -> Result<ResumeDetail, AppError> {
    validate_id(id)?;
    Ok(state.resumes.get_public_by_id(id).await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/rpc/resume/tags/list
pub async fn handle_list_tags(
    State(state): State<AppState>,
    inbound: InboundCall,
) -> Result<Json<Vec<String>>, AppError> {
    let ctx = state.policy.admit(&TAGS_LIST, inbound).await?;
    Ok(Json(state.resumes.list_tags(&ctx.forwarded()).await?))
}

/// POST /api/rpc/resume/statistics/getById
pub async fn handle_get_statistics(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<ResumeStatistics>, AppError> {
    let ctx = state.policy.admit(&STATISTICS_GET_BY_ID, inbound).await?;
    let input: IdInput = parse_input(&STATISTICS_GET_BY_ID, &body)?;
    validate_id(&input.id)?;
    Ok(Json(
        state.resumes.statistics(&ctx.forwarded(), &input.id).await?,
    ))
}

/// POST /api/rpc/resume/statistics/increment
pub async fn handle_increment_statistics(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    state.policy.admit(&STATISTICS_INCREMENT, inbound).await?;
    let input: IncrementInput = parse_input(&STATISTICS_INCREMENT, &body)?;
    validate_id(&input.id)?;
    state
        .resumes
        .increment_statistics(&input.id, input.views, input.downloads)
        .await?;
    Ok(Json(()))
}

/// POST /api/rpc/resume/list
///
/// The body is optional; an empty one lists everything, newest first.
pub async fn handle_list(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let ctx = state.policy.admit(&LIST, inbound).await?;
    let input: ListInput = parse_optional_input(&LIST, &body)?;
    Ok(Json(
        state
            .resumes
            .list(&ctx.forwarded(), &input.tags, input.sort)
            .await?,
    ))
}

/// POST /api/rpc/resume/getById
pub async fn handle_get_by_id(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<ResumeDetail>, AppError> {
    let ctx = state.policy.admit(&GET_BY_ID, inbound).await?;
    let input: IdInput = parse_input(&GET_BY_ID, &body)?;
    validate_id(&input.id)?;
    Ok(Json(
        state.resumes.get_by_id(&ctx.forwarded(), &input.id).await?,
    ))
}

/// POST /api/rpc/resume/getByIdForPrinter
pub async fn handle_get_by_id_for_printer(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<ResumeDetail>, AppError> {
    let ctx = state.policy.admit(&GET_BY_ID_FOR_PRINTER, inbound).await?;
    let input: IdInput = parse_input(&GET_BY_ID_FOR_PRINTER, &body)?;
    Ok(Json(load_for_printer(&state, &ctx, &input.id).await?))
}

/// POST /api/rpc/resume/getPublicById
pub async fn handle_get_public_by_id(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<ResumeDetail>, AppError> {
    state.policy.admit(&GET_PUBLIC_BY_ID, inbound).await?;
    let input: IdInput = parse_input(&GET_PUBLIC_BY_ID, &body)?;
    Ok(Json(load_public(&state, &input.id).await?))
}

/// POST /api/rpc/resume/create
pub async fn handle_create(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<String>, AppError> {
    let ctx = state.policy.admit(&CREATE, inbound).await?;
    let input: CreateInput = parse_input(&CREATE, &body)?;
    validate_label("name", &input.name)?;
    validate_label("slug", &input.slug)?;

    let resume = NewResume {
        name: input.name,
        slug: input.slug,
        tags: input.tags,
        data: None,
    };
    Ok(Json(state.resumes.create(&ctx.forwarded(), &resume).await?))
}

/// POST /api/rpc/resume/update
pub async fn handle_update(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    let ctx = state.policy.admit(&UPDATE, inbound).await?;
    let input: UpdateInput = parse_input(&UPDATE, &body)?;
    validate_id(&input.id)?;
    if let Some(name) = &input.patch.name {
        validate_label("name", name)?;
    }
    if let Some(slug) = &input.patch.slug {
        validate_label("slug", slug)?;
    }

    state
        .resumes
        .update(&ctx.forwarded(), &input.id, &input.patch)
        .await?;
    Ok(Json(()))
}

/// POST /api/rpc/resume/setLocked
pub async fn handle_set_locked(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    let ctx = state.policy.admit(&SET_LOCKED, inbound).await?;
    let input: SetLockedInput = parse_input(&SET_LOCKED, &body)?;
    validate_id(&input.id)?;
    state
        .resumes
        .set_locked(&ctx.forwarded(), &input.id, input.is_locked)
        .await?;
    Ok(Json(()))
}

/// POST /api/rpc/resume/setPassword
pub async fn handle_set_password(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    let ctx = state.policy.admit(&SET_PASSWORD, inbound).await?;
    let input: SetPasswordInput = parse_input(&SET_PASSWORD, &body)?;
    validate_id(&input.id)?;
    validate_password(&input.password)?;
    state
        .resumes
        .set_password(&ctx.forwarded(), &input.id, &input.password)
        .await?;
    Ok(Json(()))
}

/// POST /api/rpc/resume/removePassword
pub async fn handle_remove_password(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    let ctx = state.policy.admit(&REMOVE_PASSWORD, inbound).await?;
    let input: IdInput = parse_input(&REMOVE_PASSWORD, &body)?;
    validate_id(&input.id)?;
    state
        .resumes
        .remove_password(&ctx.forwarded(), &input.id)
        .await?;
    Ok(Json(()))
}

/// POST /api/rpc/resume/duplicate
pub async fn handle_duplicate(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<String>, AppError> {
    let ctx = state.policy.admit(&DUPLICATE, inbound).await?;
    let input: DuplicateInput = parse_input(&DUPLICATE, &body)?;
    validate_id(&input.id)?;
    for (field, value) in [("name", &input.name), ("slug", &input.slug)] {
        if let Some(value) = value {
            validate_label(field, value)?;
        }
    }

    let overrides = DuplicateOverrides {
        name: input.name,
        slug: input.slug,
        tags: input.tags,
    };
    Ok(Json(
        state
            .resumes
            .duplicate(&ctx.forwarded(), &input.id, overrides)
            .await?,
    ))
}

/// POST /api/rpc/resume/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    inbound: InboundCall,
    body: Bytes,
) -> Result<Json<()>, AppError> {
    let ctx = state.policy.admit(&DELETE, inbound).await?;
    let input: IdInput = parse_input(&DELETE, &body)?;
    validate_id(&input.id)?;
    state.resumes.delete(&ctx.forwarded(), &input.id).await?;
    Ok(Json(()))
}
