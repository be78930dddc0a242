use std::sync::Arc;

use wizflow_core::store::WorkflowStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Workflow persistence (Postgres or in-memory).
    pub store: Arc<dyn WorkflowStore>,
    /// Server configuration (upload directory and limits are read by handlers).
    pub config: Arc<ServerConfig>,
}
