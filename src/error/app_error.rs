use crate::config::ConfigError;
use crate::error::DatabaseErrorConverter;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use diesel_async::pooled_connection::PoolError;
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type that represents all possible errors in the system.
///
/// Repositories produce the persistence variants, services add the operation and
/// key context, and only the HTTP layer decides which status code each variant
/// maps to.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Several field validation failures reported at once
    #[error("Validation failed: {} field error(s)", errors.len())]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Bad request error with descriptive message
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Request body over the configured size limit
    #[error("Payload too large: {message}")]
    PayloadTooLarge { message: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// No usable connection, from the pool or a dropped session
    #[error("Connection pool error: {operation}")]
    ConnectionPool {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

/// A single field failure inside [`AppError::ValidationErrors`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl ValidationFieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl AppError {
    pub fn not_found(
        entity: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        AppError::NotFound {
            entity: entity.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefixes the operation of a persistence error with caller context.
    ///
    /// Variants without an operation are returned untouched.
    pub fn context(self, context: impl AsRef<str>) -> Self {
        let prefixed = |operation: String| format!("{}: {}", context.as_ref(), operation);
        match self {
            AppError::Database { operation, source } => AppError::Database {
                operation: prefixed(operation),
                source,
            },
            AppError::ConnectionPool { operation, source } => AppError::ConnectionPool {
                operation: prefixed(operation),
                source,
            },
            other => other,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

/// Operation recorded when a connection cannot be checked out.
const ACQUIRE_CONNECTION: &str = "acquire connection";

impl From<bb8::RunError<PoolError>> for AppError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        AppError::ConnectionPool {
            operation: ACQUIRE_CONNECTION.to_string(),
            source: anyhow::Error::msg(error.to_string()),
        }
    }
}

impl From<PoolError> for AppError {
    fn from(error: PoolError) -> Self {
        AppError::ConnectionPool {
            operation: ACQUIRE_CONNECTION.to_string(),
            source: anyhow::Error::msg(error.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid ({})", field, error.code));
                    ValidationFieldError::new(field.to_string(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors { errors: fields }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        if rejection.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge { message };
        }
        AppError::BadRequest { message }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError::Configuration {
            key: error.key().to_string(),
            source: anyhow::Error::new(error),
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "codigo is required"))]
        codigo: String,
        #[validate(length(max = 3))]
        descricao: String,
    }

    #[test]
    fn test_context_prefixes_database_operation() {
        let error = AppError::Database {
            operation: "insert ncm".to_string(),
            source: anyhow::anyhow!("boom"),
        }
        .context("create ncm code=0101");

        match error {
            AppError::Database { operation, .. } => {
                assert_eq!(operation, "create ncm code=0101: insert ncm");
            }
            _ => panic!("Expected Database error, got {:?}", error),
        }
    }

    #[test]
    fn test_context_prefixes_pool_operation() {
        let error = AppError::ConnectionPool {
            operation: ACQUIRE_CONNECTION.to_string(),
            source: anyhow::anyhow!("timed out"),
        }
        .context("delete ncm id=42");

        match error {
            AppError::ConnectionPool { operation, .. } => {
                assert_eq!(operation, "delete ncm id=42: acquire connection");
            }
            _ => panic!("Expected ConnectionPool error, got {:?}", error),
        }
    }

    #[test]
    fn test_context_keeps_not_found() {
        let error = AppError::not_found("ncm", "id", "42").context("get ncm");
        assert!(matches!(error, AppError::NotFound { ref value, .. } if value == "42"));
    }

    #[test]
    fn test_validator_errors_are_flattened_and_sorted() {
        let sample = Sample {
            codigo: String::new(),
            descricao: "too long".to_string(),
        };
        let error = AppError::from(sample.validate().unwrap_err());

        match error {
            AppError::ValidationErrors { errors } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0], ValidationFieldError::new("codigo", "codigo is required"));
                assert_eq!(errors[1].field, "descricao");
                assert!(errors[1].message.contains("length"));
            }
            _ => panic!("Expected ValidationErrors error, got {:?}", error),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::validation("codigo", "must not be blank").to_string(),
            "Validation failed for codigo: must not be blank"
        );
        assert_eq!(
            AppError::not_found("ncm", "id", "x").to_string(),
            "Resource not found: ncm with id=x"
        );
    }
}
