use crate::store::StoreError;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// A workflow candidate failed one or more schema rules. Every violated
    /// rule is listed, in check order.
    #[error("{}", .errors.join(", "))]
    InvalidWorkflow { errors: Vec<String> },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
