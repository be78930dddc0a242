use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use wizflow_core::error::CoreError;

use crate::state::AppState;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `wizflow_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The multipart payload could not be read or violated a limit.
    #[error("File upload error: {0}")]
    Upload(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Upload(err.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::Upload(rejection.body_text())
    }
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

const INTERNAL_MESSAGE: &str = "An internal error occurred";
const INTERNAL_CODE: &str = "INTERNAL_ERROR";

/// Message behind a sanitized 500, carried as a response extension. It only
/// reaches the body through [`expose_error_detail`].
#[derive(Debug, Clone)]
pub struct InternalErrorDetail(pub String);

fn internal(detail: String) -> (StatusCode, &'static str, String, Option<Vec<String>>, Option<String>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_CODE,
        INTERNAL_MESSAGE.to_string(),
        None,
        Some(detail),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, errors, detail) = match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                    None,
                ),
                CoreError::InvalidWorkflow { errors } => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    errors.join(", "),
                    Some(errors),
                    None,
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None, None)
                }
                CoreError::Store(err) => {
                    tracing::error!(error = %err, "Store error");
                    internal(err.to_string())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal(msg)
                }
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None, None),
            AppError::Upload(msg) => (
                StatusCode::BAD_REQUEST,
                "UPLOAD_ERROR",
                format!("File upload error: {msg}"),
                None,
                None,
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal(msg)
            }
        };

        let body = ErrorBody {
            success: false,
            error: message,
            code,
            errors,
            detail: None,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let Some(detail) = detail {
            response.extensions_mut().insert(InternalErrorDetail(detail));
        }
        response
    }
}

/// Response mapper that adds `detail` to sanitized 500 bodies when the
/// server runs in development mode. Production responses pass unchanged.
///
/// Install with `axum::middleware::map_response_with_state`.
pub async fn expose_error_detail(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(InternalErrorDetail(detail)) =
        response.extensions_mut().remove::<InternalErrorDetail>()
    else {
        return response;
    };
    if !state.config.environment.is_development() {
        return response;
    }

    let body = ErrorBody {
        success: false,
        error: INTERNAL_MESSAGE.to_string(),
        code: INTERNAL_CODE,
        errors: None,
        detail: Some(detail),
    };
    (response.status(), axum::Json(body)).into_response()
}
