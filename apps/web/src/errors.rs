use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Normalised failure categories shared by the backend transport and the RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NeedPassword,
    InvalidPassword,
    NotFound,
    Unauthorized,
    Conflict,
    SlugAlreadyExists,
    BadRequest,
    InternalError,
    NetworkFailure,
    CancellationRequested,
    NotSupported,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::NeedPassword => "NEED_PASSWORD",
            ErrorKind::InvalidPassword => "INVALID_PASSWORD",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::SlugAlreadyExists => "RESUME_SLUG_ALREADY_EXISTS",
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::InternalError => "INTERNAL_SERVER_ERROR",
            ErrorKind::NetworkFailure => "NETWORK_FAILURE",
            ErrorKind::CancellationRequested => "CANCELLATION_REQUESTED",
            ErrorKind::NotSupported => "NOT_SUPPORTED",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NeedPassword | ErrorKind::InvalidPassword | ErrorKind::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::SlugAlreadyExists | ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::NetworkFailure => StatusCode::BAD_GATEWAY,
            // nginx's "client closed request"
            ErrorKind::CancellationRequested => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
            }
            ErrorKind::NotSupported => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

/// A failed backend call: what the backend said, what it means, and the HTTP status if one arrived.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Builds the error for a non-2xx response. `message` is the backend's
    /// `message` field, or the status reason when the body had none.
    pub fn from_response(status: u16, message: Option<&str>) -> Self {
        let (kind, message) = classify(status, message);
        Self {
            kind,
            message,
            status: Some(status),
        }
    }

    pub fn network(err: reqwest::Error) -> Self {
        Self::new(ErrorKind::NetworkFailure, err.to_string())
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::CancellationRequested, "Request was cancelled")
    }

    pub fn not_supported() -> Self {
        Self::new(
            ErrorKind::NotSupported,
            "Not supported in the unified backend auth flow.",
        )
    }

    /// Only a real 401 from the backend qualifies; cancellations never do.
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(401) && self.kind != ErrorKind::CancellationRequested
    }
}

/// Maps a backend failure to an error kind.
///
/// Message sniffing wins over the status code: a 400 whose message mentions
/// a slug is a slug collision, not a generic bad request.
pub fn classify(status: u16, message: Option<&str>) -> (ErrorKind, String) {
    if let Some(message) = message {
        let lower = message.to_lowercase();
        if lower.contains("password required") {
            return (ErrorKind::NeedPassword, message.to_string());
        }
        if lower.contains("invalid password") {
            return (ErrorKind::InvalidPassword, message.to_string());
        }
        if lower.contains("slug") {
            return (
                ErrorKind::SlugAlreadyExists,
                ErrorKind::SlugAlreadyExists.code().to_string(),
            );
        }
    }

    let kind = match status {
        401 => ErrorKind::Unauthorized,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        s if s >= 500 => ErrorKind::InternalError,
        _ => ErrorKind::BadRequest,
    };
    let message = message.unwrap_or("Request failed").to_string();
    (kind, message)
}

/// RPC-surface error.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized(Option<String>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Backend(#[from] BackendError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Validation(_) => ErrorKind::BadRequest,
            AppError::Backend(e) => e.kind,
            AppError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match &self {
            AppError::Unauthorized(msg) => msg
                .clone()
                .unwrap_or_else(|| "Authentication required".to_string()),
            AppError::Validation(msg) => msg.clone(),
            AppError::Backend(e) => {
                if kind == ErrorKind::InternalError || kind == ErrorKind::NetworkFailure {
                    tracing::error!("Backend error ({:?}): {}", e.status, e.message);
                }
                e.message.clone()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": kind.code(),
                "message": message
            }
        }));

        (kind.status(), body).into_response()
    }
}
