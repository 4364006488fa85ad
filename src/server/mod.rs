//! HTTP server for the prediction endpoint.
//!
//! - [`predict_api`]: Router, shared state and route handlers
//! - [`request`]: Request body validation and feature coercion
//! - [`error`]: Boundary error type and its status/body mapping

pub mod error;
pub mod predict_api;
pub mod request;
