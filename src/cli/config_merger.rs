//! Applies CLI overrides on top of file and environment configuration.
//!
//! Precedence, lowest first: loaded settings, `--verbose`/`--quiet`,
//! subcommand flags.

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base settings honoring `--config` and `--env`.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut loader = ConfigLoader::new()?;
        if let Some(ref path) = cli.config {
            loader = loader.with_config_file(path);
        }
        if let Some(env) = cli.env {
            loader = loader.with_environment(env.into());
        }
        Ok(Self::new(loader.load()?))
    }

    /// Returns the base settings with CLI overrides applied and re-validated.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(Commands::Serve {
            host,
            port,
            log_level,
            ..
        }) = &cli.command
        {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default())
            .merge_cli_args(&cli)
            .unwrap()
    }

    #[test]
    fn test_no_flags_keeps_base() {
        let merger = ConfigurationMerger::new(Settings::default());
        let cli = Cli::try_parse_from(["codexfiscal"]).unwrap();
        assert_eq!(&merger.merge_cli_args(&cli).unwrap(), merger.config());
    }

    #[test]
    fn test_verbose_and_quiet() {
        assert_eq!(merge(&["codexfiscal", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["codexfiscal", "--quiet"]).logger.level, "error");
    }

    #[test]
    fn test_serve_overrides() {
        let config = merge(&["codexfiscal", "serve", "--host", "127.0.0.1", "--port", "9090"]);
        assert_eq!(config.server.address(), "127.0.0.1:9090");
    }

    #[test]
    fn test_log_level_beats_global_flag() {
        let config = merge(&["codexfiscal", "--verbose", "serve", "--log-level", "warn"]);
        assert_eq!(config.logger.level, "warn");
    }

    #[test]
    fn test_migrate_ignores_server_settings() {
        let config = merge(&["codexfiscal", "migrate"]);
        assert_eq!(config.server, Settings::default().server);
    }

    #[test]
    fn test_merged_settings_are_validated() {
        let mut base = Settings::default();
        base.database.min_connections = 50;
        let cli = Cli::try_parse_from(["codexfiscal"]).unwrap();

        assert!(ConfigurationMerger::new(base).merge_cli_args(&cli).is_err());
    }
}
