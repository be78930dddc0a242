pub mod health;
pub mod workflow;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /workflows                       list, create
/// /workflows/{id}                  get, update, delete
/// /workflows/{id}/files            upload (multipart)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new().nest("/workflows", workflow::router(config))
}
