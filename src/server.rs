//! HTTP server lifecycle: startup, schema check, serving and graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::Settings;
use crate::db::{ensure_schema, establish_async_connection_pool};
use crate::state::AppState;

pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Runs until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    /// Any failure before the listener is bound aborts startup: pool
    /// creation, the schema check or migration, and binding the address.
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = self.settings;

        tracing::info!(
            app_name = %settings.application.name,
            app_version = %settings.application.version,
            "Application starting"
        );
        tracing::info!(
            host = %settings.server.host,
            port = settings.server.port,
            request_timeout = settings.server.request_timeout,
            body_limit = settings.server.body_limit,
            "Server configuration loaded"
        );
        tracing::info!(
            target_db = %settings.database.redacted(),
            max_connections = settings.database.max_connections,
            min_connections = settings.database.min_connections,
            auto_migrate = settings.database.auto_migrate,
            "Database configuration loaded"
        );

        let pool = establish_async_connection_pool(&settings.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to the database: {}", e))?;
        tracing::info!("Database connection pool initialized");

        if settings.database.auto_migrate {
            ensure_schema(&settings.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to prepare the database schema: {}", e))?;
        }

        let router = create_router(AppState::new(pool), &settings.server);

        let address = settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {}: {}", address, e)
        })?;
        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
///
/// A signal handler that cannot be installed never resolves, so the other
/// one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
