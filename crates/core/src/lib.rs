//! Domain layer for the workflow wizard backend.
//!
//! Holds the workflow entity and its validation rules, the store contract
//! and its in-memory implementation, the service operations the HTTP
//! surface calls, upload constraints, and the wizard navigation rules
//! shared by the client.

pub mod error;
pub mod service;
pub mod store;
pub mod types;
pub mod upload;
pub mod wizard;
pub mod workflow;
