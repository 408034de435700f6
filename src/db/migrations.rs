//! Embedded schema migrations.
//!
//! Migrations run over a blocking `PgConnection` on the blocking thread pool,
//! since `diesel_migrations` has no async harness.

use diesel::pg::PgConnection;
use diesel::sql_types::Bool;
use diesel::{Connection, RunQueryDsl};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Table whose presence marks the schema as installed
const NCM_TABLE: &str = "ncm";

/// Outcome of [`ensure_schema`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The table already existed; nothing was run
    Present,
    /// The table was missing and these migrations were applied
    Created(Vec<String>),
}

fn migration_error(operation: &str, error: impl std::fmt::Display) -> AppError {
    AppError::Database {
        operation: operation.to_string(),
        source: anyhow::anyhow!("{}", error),
    }
}

fn connect(config: &DatabaseConfig) -> AppResult<PgConnection> {
    PgConnection::establish(&config.connection_string())
        .map_err(|e| migration_error("establish migration connection", e))
}

fn table_exists(conn: &mut PgConnection, table: &str) -> AppResult<bool> {
    let query = format!(
        "EXISTS (SELECT 1 FROM information_schema.tables \
         WHERE table_schema = current_schema() AND table_name = '{}')",
        table.replace('\'', "''")
    );
    diesel::select(diesel::dsl::sql::<Bool>(&query))
        .get_result(conn)
        .map_err(|e| migration_error("check schema", e))
}

fn apply_pending(conn: &mut PgConnection) -> AppResult<Vec<String>> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| migration_error("run pending migrations", e))?;
    Ok(applied.iter().map(|version| version.to_string()).collect())
}

/// Runs `job` with a fresh blocking connection on the blocking pool.
async fn with_blocking_connection<T, F>(config: &DatabaseConfig, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
{
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = connect(&config)?;
        job(&mut conn)
    })
    .await
    .map_err(|e| AppError::Internal {
        source: anyhow::Error::new(e),
    })?
}

/// Creates the `ncm` table when it does not exist yet.
pub async fn ensure_schema(config: &DatabaseConfig) -> AppResult<SchemaStatus> {
    let status = with_blocking_connection(config, |conn| {
        if table_exists(conn, NCM_TABLE)? {
            return Ok(SchemaStatus::Present);
        }
        apply_pending(conn).map(SchemaStatus::Created)
    })
    .await?;

    match &status {
        SchemaStatus::Present => info!(table = NCM_TABLE, "Schema already present"),
        SchemaStatus::Created(applied) => {
            info!(table = NCM_TABLE, migrations = ?applied, "Schema created")
        }
    }
    Ok(status)
}

/// Versions of embedded migrations not yet applied.
pub async fn pending_migrations(config: &DatabaseConfig) -> AppResult<Vec<String>> {
    with_blocking_connection(config, |conn| {
        let pending = conn
            .pending_migrations(MIGRATIONS)
            .map_err(|e| migration_error("list pending migrations", e))?;
        Ok(pending.iter().map(|m| m.name().to_string()).collect())
    })
    .await
}

/// Applies every pending migration and returns the applied versions.
pub async fn run_pending_migrations(config: &DatabaseConfig) -> AppResult<Vec<String>> {
    with_blocking_connection(config, apply_pending).await
}
