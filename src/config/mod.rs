//! Configuration management for codexfiscal
//!
//! Settings are layered from TOML files under `config/`, `CODEX_*`
//! environment variables and the plain `DB_*` variables, then validated.
//! See [`ConfigLoader`] for the exact precedence.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, DatabaseConfig, LoggerSettings, ServerConfig, Settings,
};
