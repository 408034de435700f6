//! Layered configuration loading.
//!
//! Sources, lowest priority first:
//! 1. `default.toml` (optional)
//! 2. `{environment}.toml` (optional)
//! 3. `local.toml` (optional)
//! 4. `CODEX_*` environment variables, `__` between nested keys
//! 5. `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_SSLMODE`
//!
//! When a single file is selected (`CODEX_CONFIG_FILE` or `--config`) it
//! replaces steps 1 to 3 and must exist.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

const CONFIG_DIR_ENV: &str = "CODEX_CONFIG_DIR";

const CONFIG_FILE_ENV: &str = "CODEX_CONFIG_FILE";

const DEFAULT_CONFIG_DIR: &str = "config";

const ENV_PREFIX: &str = "CODEX";

const ENV_SEPARATOR: &str = "__";

/// Plain database variables and the setting each one overrides
const DATABASE_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("DB_SSLMODE", "database.ssl_mode"),
];

type Builder = ConfigBuilder<DefaultState>;

#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    /// When set, layered loading is skipped
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Creates a loader from `CODEX_CONFIG_DIR`, `CODEX_CONFIG_FILE` and
    /// `CODEX_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Fails when both `CODEX_CONFIG_DIR` and `CODEX_CONFIG_FILE` are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_dir.is_some() && config_file.is_some() {
            return Err(ConfigError::mutual_exclusivity(format!(
                "{} and {} cannot both be set. Use {} for layered configuration or {} for a single configuration file.",
                CONFIG_DIR_ENV, CONFIG_FILE_ENV, CONFIG_DIR_ENV, CONFIG_FILE_ENV
            )));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loads a single file instead of the layered directory.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads, deserializes and validates the settings.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let settings: Settings = self.build_config()?.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }

    fn build_config(&self) -> Result<Config, ConfigError> {
        let builder = match self.config_file {
            Some(ref file) => add_file_source(Config::builder(), file, true)?,
            None => self.build_layered_config(Config::builder())?,
        };

        let builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        );

        apply_database_overrides(builder)?
            .build()
            .map_err(ConfigError::from)
    }

    fn build_layered_config(&self, builder: Builder) -> Result<Builder, ConfigError> {
        let env_file = format!("{}.toml", self.environment.as_str());

        ["default.toml", env_file.as_str(), "local.toml"]
            .into_iter()
            .try_fold(builder, |builder, name| {
                add_file_source(builder, &self.config_dir.join(name), false)
            })
    }
}

fn add_file_source(builder: Builder, path: &Path, required: bool) -> Result<Builder, ConfigError> {
    if required && !path.is_file() {
        return Err(ConfigError::file_not_found(path.display().to_string()));
    }

    let name = path.to_str().ok_or_else(|| {
        ConfigError::ParseError(format!("Configuration path is not valid UTF-8: {}", path.display()))
    })?;

    Ok(builder.add_source(File::new(name, FileFormat::Toml).required(required)))
}

fn apply_database_overrides(mut builder: Builder) -> Result<Builder, ConfigError> {
    for (var, key) in DATABASE_ENV_OVERRIDES {
        let value = std::env::var(var).ok().filter(|v| !v.is_empty());

        builder = match (*var, value) {
            ("DB_PORT", Some(raw)) => {
                let port: u16 = raw.trim().parse().map_err(|_| {
                    ConfigError::EnvVarError(format!("{} must be a port number, got '{}'", var, raw))
                })?;
                builder.set_override(*key, i64::from(port))?
            }
            (_, value) => builder.set_override_option(*key, value)?,
        };
    }
    Ok(builder)
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}
