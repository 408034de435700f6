use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Converts diesel errors into structured [`AppError`] variants.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a diesel error, tagging persistence failures with `operation`.
    ///
    /// Constraint violations stay persistence errors; the parsed constraint
    /// only sharpens the message. `NotFound` is reported against a generic `resource`; repositories that
    /// know the entity build their own [`AppError::NotFound`] instead.
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::not_found("resource", "id", "unknown"),
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        let message = info.message();
        let constraint_name = info.constraint_name();

        if let DatabaseErrorKind::ClosedConnection = kind {
            return AppError::ConnectionPool {
                operation: operation.to_string(),
                source: anyhow::Error::msg(message.to_string()),
            };
        }

        let description = match kind {
            DatabaseErrorKind::UniqueViolation => {
                ConstraintParser::parse_unique_violation(message, constraint_name).map(
                    |(entity, field, value)| {
                        format!("Unique constraint violation on {}.{} = '{}'", entity, field, value)
                    },
                )
            }
            DatabaseErrorKind::NotNullViolation => {
                ConstraintParser::parse_not_null_violation(message, constraint_name)
                    .map(|(entity, field)| format!("Not null constraint violation on {}.{}", entity, field))
            }
            DatabaseErrorKind::CheckViolation => {
                ConstraintParser::parse_check_violation(message, constraint_name)
                    .map(|(entity, field)| format!("Check constraint violation on {}.{}", entity, field))
            }
            _ => None,
        }
        .unwrap_or_else(|| format!("{}: {}", Self::label(&kind), message));

        AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(description),
        }
    }

    fn label(kind: &DatabaseErrorKind) -> &'static str {
        match kind {
            DatabaseErrorKind::UniqueViolation => "Unique constraint violation",
            DatabaseErrorKind::NotNullViolation => "Not null constraint violation",
            DatabaseErrorKind::CheckViolation => "Check constraint violation",
            DatabaseErrorKind::ForeignKeyViolation => "Foreign key violation",
            _ => "Database error",
        }
    }
}
