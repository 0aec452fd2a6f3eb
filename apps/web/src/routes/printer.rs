use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::ForwardedHeaders;
use crate::errors::AppError;
use crate::models::resume::ResumeDetail;
use crate::rpc::ServerCaller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PrinterQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrinterResume {
    pub resume: ResumeDetail,
    pub locale: String,
}

/// GET /api/printer/resume?id=<resume id>
///
/// Loads the resume the printer renders: the owner's copy when the request
/// carries credentials, otherwise the public one.
pub async fn handle_printer_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PrinterQuery>,
) -> Result<Json<PrinterResume>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Missing resume id".to_string()))?;

    let caller = ServerCaller::new(&state, &headers);
    let called = if ForwardedHeaders::from_headers(&headers).is_empty() {
        caller.public_resume(&id).await?
    } else {
        caller.resume_for_printer(&id).await?
    };

    Ok(Json(PrinterResume {
        resume: called.value,
        locale: called.ctx.locale.0,
    }))
}
