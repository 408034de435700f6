//! Middleware components for request processing.
//!
//! This module contains middleware for logging, request ID tracking,
//! request deadlines and error handling.

mod error_handler;
mod logging;
mod request_id;
mod timeout;

pub use error_handler::{error_to_code, error_to_status_code, global_error_handler};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use timeout::request_timeout_layer;
