//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `ncm` - NCM request/response DTOs
//! - `health` - Health probe responses
//! - `error` - Common error response DTOs

mod error;
mod health;
mod ncm;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use ncm::{CodesQuery, NcmRequest, NcmResponse, TextQuery, validate_batch};
