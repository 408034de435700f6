//! Configuration settings structures for codexfiscal
//!
//! Every section can be loaded from TOML files and `CODEX_*` environment
//! variables. Missing keys fall back to the defaults below.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "codexfiscal".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_body_limit() -> usize {
    // Bulk imports of the full NCM table run to a few megabytes
    16 * 1024 * 1024
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "root".to_string()
}

fn default_db_password() -> String {
    "admin".to_string()
}

fn default_db_name() -> String {
    "codexfiscal".to_string()
}

fn default_ssl_mode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/codexfiscal.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Maximum accepted request body, in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

impl ServerConfig {
    /// Socket address string in `host:port` form
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            body_limit: default_body_limit(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// PostgreSQL connection and pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub name: String,

    /// `disable`, `prefer` or `require`
    #[serde(default = "default_ssl_mode")]
    pub ssl_mode: String,

    /// Full connection string; when set, the discrete fields above are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection checkout timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Create the `ncm` table at startup when it is missing
    #[serde(default = "default_true")]
    pub auto_migrate: bool,
}

impl DatabaseConfig {
    /// Connection string handed to the driver.
    ///
    /// Built in libpq keyword/value form so it is understood by both the
    /// async pool and the blocking migration connection.
    pub fn connection_string(&self) -> String {
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }

        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote_value(&self.host),
            self.port,
            quote_value(&self.user),
            quote_value(&self.password),
            quote_value(&self.name),
            quote_value(&self.ssl_mode.to_lowercase()),
        )
    }

    /// Connection target with the password left out, for logs
    pub fn redacted(&self) -> String {
        match self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(_) => "<database.url>".to_string(),
            None => format!(
                "{}@{}:{}/{} (sslmode={})",
                self.user, self.host, self.port, self.name, self.ssl_mode
            ),
        }
    }
}

/// Quotes a keyword/value parameter when it is empty or contains spaces,
/// quotes or backslashes.
fn quote_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_string();
    }

    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            name: default_db_name(),
            ssl_mode: default_ssl_mode(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: default_true(),
        }
    }
}

// ============================================================================
// Logger Configuration
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_path")]
    pub path: String,

    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger section as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub console: ConsoleSettings,

    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Converts the file representation into the runtime [`LoggerConfig`].
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger".to_string(), e.to_string()))
    }
}

impl FileSettings {
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self.parse_format()?;

        FileConfig::new(self.enabled, PathBuf::from(self.path), self.append, format)
            .map_err(|e| ConfigError::validation("logger.file".to_string(), e.to_string()))
    }

    fn parse_format(&self) -> Result<LogFormat, ConfigError> {
        self.format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format".to_string(), e.to_string()))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logger: LoggerSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ========================================================================
    // Strategies
    // ========================================================================

    fn arb_server_config() -> impl Strategy<Value = ServerConfig> {
        (
            prop_oneof![
                Just("127.0.0.1".to_string()),
                Just("0.0.0.0".to_string()),
                Just("localhost".to_string()),
            ],
            1u16..=65535u16,
            1u64..=300u64,
            1024usize..=64 * 1024 * 1024,
        )
            .prop_map(|(host, port, request_timeout, body_limit)| ServerConfig {
                host,
                port,
                request_timeout,
                body_limit,
            })
    }

    fn arb_database_config() -> impl Strategy<Value = DatabaseConfig> {
        (
            "[a-z][a-z0-9.-]{0,20}",
            1u16..=65535u16,
            "[a-z][a-z0-9_]{0,15}",
            "[ -~]{0,24}",
            prop_oneof![Just("disable"), Just("prefer"), Just("require")],
            proptest::option::of(Just("postgres://u:p@db:5432/codexfiscal".to_string())),
            1u32..=100u32,
            1u32..=10u32,
            any::<bool>(),
        )
            .prop_map(
                |(host, port, user, password, ssl_mode, url, max, min, auto_migrate)| {
                    DatabaseConfig {
                        host,
                        port,
                        name: user.clone(),
                        user,
                        password,
                        ssl_mode: ssl_mode.to_string(),
                        url,
                        max_connections: max,
                        min_connections: min.min(max),
                        connection_timeout: 30,
                        auto_migrate,
                    }
                },
            )
    }

    fn arb_logger_settings() -> impl Strategy<Value = LoggerSettings> {
        (
            prop_oneof![Just("trace"), Just("debug"), Just("info"), Just("warn"), Just("error")],
            any::<bool>(),
            any::<bool>(),
            prop_oneof![Just("full"), Just("compact"), Just("json")],
        )
            .prop_map(|(level, colored, file_enabled, format)| LoggerSettings {
                level: level.to_string(),
                console: ConsoleSettings {
                    enabled: true,
                    colored,
                },
                file: FileSettings {
                    enabled: file_enabled,
                    format: format.to_string(),
                    ..Default::default()
                },
            })
    }

    fn arb_settings() -> impl Strategy<Value = Settings> {
        (
            "[a-z][a-z0-9-]{0,20}",
            arb_server_config(),
            arb_database_config(),
            arb_logger_settings(),
        )
            .prop_map(|(name, server, database, logger)| Settings {
                application: ApplicationConfig {
                    name,
                    version: "1.0.0".to_string(),
                },
                server,
                database,
                logger,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_settings_toml_round_trip(settings in arb_settings()) {
            let toml_str = toml::to_string(&settings).unwrap();
            let parsed: Settings = toml::from_str(&toml_str).unwrap();
            prop_assert_eq!(settings, parsed);
        }
    }

    // ========================================================================
    // Unit tests
    // ========================================================================

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_database_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.user, "root");
        assert_eq!(config.password, "admin");
        assert_eq!(config.name, "codexfiscal");
        assert_eq!(config.ssl_mode, "disable");
        assert!(config.url.is_none());
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_connection_string_from_fields() {
        assert_eq!(
            DatabaseConfig::default().connection_string(),
            "host=localhost port=5432 user=root password=admin dbname=codexfiscal sslmode=disable"
        );
    }

    #[test]
    fn test_connection_string_quotes_special_values() {
        let config = DatabaseConfig {
            password: "it's a secret".to_string(),
            ..Default::default()
        };
        assert!(
            config
                .connection_string()
                .contains("password='it\\'s a secret'")
        );

        let empty = DatabaseConfig {
            password: String::new(),
            ..Default::default()
        };
        assert!(empty.connection_string().contains("password=''"));
    }

    #[test]
    fn test_url_overrides_fields() {
        let config = DatabaseConfig {
            url: Some("postgres://u:p@db/x".to_string()),
            ..Default::default()
        };
        assert_eq!(config.connection_string(), "postgres://u:p@db/x");
        assert_eq!(config.redacted(), "<database.url>");
    }

    #[test]
    fn test_redacted_hides_password() {
        let redacted = DatabaseConfig::default().redacted();
        assert_eq!(redacted, "root@localhost:5432/codexfiscal (sslmode=disable)");
        assert!(!redacted.contains("admin"));
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings = toml::from_str(
            r#"
            [server]
            port = 9000

            [database]
            host = "db"
            "#,
        )
        .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.database.host, "db");
        assert_eq!(settings.database.name, "codexfiscal");
        assert_eq!(settings.logger, LoggerSettings::default());
    }

    #[test]
    fn test_logger_settings_into_logger_config() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            file: FileSettings {
                enabled: true,
                path: "logs/test.log".to_string(),
                format: "compact".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.file.enabled);
        assert_eq!(config.file.format, LogFormat::Compact);
        assert_eq!(config.file.path, PathBuf::from("logs/test.log"));
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        match settings.into_logger_config() {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "logger.file.format")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_logger_settings_both_outputs_disabled() {
        let settings = LoggerSettings {
            console: ConsoleSettings {
                enabled: false,
                colored: false,
            },
            ..Default::default()
        };
        assert!(settings.into_logger_config().is_err());
    }
}
