//! Route definitions for the `/workflows` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::config::ServerConfig;
use crate::handlers::workflow;
use crate::state::AppState;

/// Routes mounted at `/workflows`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete
/// POST   /{id}/files       -> upload_files
/// ```
///
/// The upload route raises axum's default body limit so a full batch of
/// maximum-size files fits; per-file limits are enforced by the handler.
pub fn router(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(workflow::list).post(workflow::create))
        .route(
            "/{id}",
            get(workflow::get_by_id)
                .put(workflow::update)
                .delete(workflow::delete),
        )
        .route(
            "/{id}/files",
            post(workflow::upload_files)
                .layer(DefaultBodyLimit::max(config.upload_body_limit())),
        )
}
