//! Serve command handler

use crate::config::Settings;
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Starts the server, or only re-checks the configuration on a dry run.
    pub async fn execute(self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            return self.validate_only();
        }
        Server::new(self.config).run().await?;
        Ok(())
    }

    /// Prints what the server would use without connecting anywhere.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());
        println!("✓ Database target: {}", self.config.database.redacted());
        println!(
            "✓ Schema check at startup: {}",
            if self.config.database.auto_migrate { "enabled" } else { "disabled" }
        );
        println!("✓ Log level: {}", self.config.logger.level);
        Ok(())
    }
}
