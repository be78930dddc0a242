//! Request handlers.
//!
//! Handlers delegate to the service functions in `wizflow_core::service`
//! and map errors via [`crate::error::AppError`].

pub mod workflow;
