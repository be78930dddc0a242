//! Shared response envelope types for API handlers.
//!
//! Successful responses use a `{ "success": true, "data": ... }` envelope;
//! error responses are built by [`crate::error::AppError`] with
//! `success: false`. Use [`DataResponse`] instead of ad-hoc
//! `serde_json::json!` bodies to keep the shape consistent.

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse::ok(items)))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Confirmation payload for operations that return no entity.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
