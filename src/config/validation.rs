//! Range and format checks run on every loaded [`Settings`].

use crate::config::error::ConfigError;
use crate::config::settings::{DatabaseConfig, FileSettings, LoggerSettings, ServerConfig, Settings};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// SSL modes understood by the async PostgreSQL driver
const VALID_SSL_MODES: &[&str] = &["disable", "prefer", "require"];

const VALID_URL_SCHEMES: &[&str] = &["postgres://", "postgresql://"];

fn one_of(field: &str, value: &str, allowed: &[&str], what: &str) -> Result<(), ConfigError> {
    if allowed.contains(&value.to_lowercase().as_str()) {
        return Ok(());
    }
    Err(ConfigError::validation(
        field,
        format!(
            "Invalid {} '{}'. Valid values are: {}",
            what,
            value,
            allowed.join(", ")
        ),
    ))
}

impl ServerConfig {
    /// Port, request timeout and body limit must all be non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.body_limit == 0 {
            return Err(ConfigError::validation(
                "server.body_limit",
                "Body limit must be greater than 0 bytes.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - `url`, when given, must use a PostgreSQL scheme
    /// - otherwise `host`, `user` and `name` must not be blank and `port` must be non-zero
    /// - `ssl_mode` must be one of `disable`, `prefer`, `require`
    /// - pool sizes must be non-zero with `min_connections <= max_connections`
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                if !VALID_URL_SCHEMES.iter().any(|s| url.starts_with(s)) {
                    return Err(ConfigError::validation(
                        "database.url",
                        "Invalid database URL. Expected postgres://[user:password@]host[:port]/database",
                    ));
                }
            }
            _ => self.validate_fields()?,
        }

        one_of(
            "database.ssl_mode",
            &self.ssl_mode,
            VALID_SSL_MODES,
            "SSL mode",
        )?;

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::validation(
                "database.min_connections",
                format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "database.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }

    fn validate_fields(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("database.host", &self.host),
            ("database.user", &self.user),
            ("database.name", &self.name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::validation(field, "Value must not be empty."));
            }
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "database.port",
                "Port must be between 1 and 65535.",
            ));
        }
        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        one_of("logger.file.format", &self.format, VALID_LOG_FORMATS, "log format")
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        one_of("logger.level", &self.level, VALID_LOG_LEVELS, "log level")?;

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validates every section, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.application.name.trim().is_empty() {
            return Err(ConfigError::validation(
                "application.name",
                "Application name must not be empty.",
            ));
        }

        self.server.validate()?;
        self.database.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::ConsoleSettings;

    fn field_of(result: Result<(), ConfigError>) -> String {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_server_zero_port() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "server.port");
    }

    #[test]
    fn test_server_zero_body_limit() {
        let config = ServerConfig {
            body_limit: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "server.body_limit");
    }

    #[test]
    fn test_database_ssl_modes() {
        for mode in ["disable", "prefer", "require", "DISABLE"] {
            let config = DatabaseConfig {
                ssl_mode: mode.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{mode} should be accepted");
        }

        let config = DatabaseConfig {
            ssl_mode: "verify-full".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "database.ssl_mode");
    }

    #[test]
    fn test_database_blank_host() {
        let config = DatabaseConfig {
            host: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "database.host");
    }

    #[test]
    fn test_database_url_skips_field_checks() {
        let config = DatabaseConfig {
            host: String::new(),
            url: Some("postgresql://db/codexfiscal".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_database_url_scheme() {
        let config = DatabaseConfig {
            url: Some("mysql://db/codexfiscal".to_string()),
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "database.url");
    }

    #[test]
    fn test_database_pool_bounds() {
        let config = DatabaseConfig {
            max_connections: 2,
            min_connections: 5,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "database.min_connections");

        let config = DatabaseConfig {
            max_connections: 0,
            ..Default::default()
        };
        assert_eq!(field_of(config.validate()), "database.max_connections");
    }

    #[test]
    fn test_logger_level() {
        let settings = LoggerSettings {
            level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate()), "logger.level");
    }

    #[test]
    fn test_logger_requires_an_output() {
        let settings = LoggerSettings {
            console: ConsoleSettings {
                enabled: false,
                colored: false,
            },
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate()), "logger");
    }

    #[test]
    fn test_logger_file_path_required_when_enabled() {
        let settings = LoggerSettings {
            file: FileSettings {
                enabled: true,
                path: String::new(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(field_of(settings.validate()), "logger.file.path");
    }
}
