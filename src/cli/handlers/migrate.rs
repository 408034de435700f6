//! Migrate command handler

use crate::config::Settings;
use crate::db::{pending_migrations, run_pending_migrations};
use crate::error::AppResult;

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Applies pending migrations, or lists them when `dry_run` is set.
    ///
    /// # Errors
    /// - Invalid database settings
    /// - Connection or migration failures
    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        self.config.database.validate()?;
        tracing::info!(target_db = %self.config.database.redacted(), dry_run, "Migrating");

        if dry_run {
            let pending = pending_migrations(&self.config.database).await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        let applied = run_pending_migrations(&self.config.database).await?;
        if applied.is_empty() {
            println!("✓ No migrations to apply - database is up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {}", version);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_database_settings_fail_before_connecting() {
        let mut config = Settings::default();
        config.database.ssl_mode = "sometimes".to_string();
        let handler = MigrateCommandHandler::new(config);

        let result = handler.execute(true).await;
        assert!(matches!(
            result,
            Err(crate::error::AppError::Configuration { ref key, .. }) if key == "database.ssl_mode"
        ));
    }
}
