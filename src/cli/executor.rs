//! Dispatches a parsed command to its handler.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::AppResult;

/// Runs the selected subcommand with already merged settings.
///
/// A bare invocation behaves like `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    match cli.resolved_command() {
        Commands::Serve { dry_run, .. } => {
            ServeCommandHandler::new(settings).execute(dry_run).await
        }
        Commands::Migrate { dry_run } => MigrateCommandHandler::new(settings).execute(dry_run).await,
    }
}
