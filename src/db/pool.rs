//! Async database connection pool.
//!
//! Uses the bb8 pool manager from diesel_async for PostgreSQL connections.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::Pool;

use crate::config::DatabaseConfig;
use crate::error::AppResult;

/// Async connection pool type alias.
///
/// bb8::Pool is reference counted internally, so cloning it is cheap.
pub type AsyncDbPool = Pool<AsyncPgConnection>;

/// Builds the connection pool described by `config`.
///
/// The first connection is opened eagerly, so an unreachable database fails
/// here instead of on the first request.
///
/// # Example
///
/// ```ignore
/// let pool = establish_async_connection_pool(&settings.database).await?;
/// let mut conn = pool.get().await?;
/// ```
pub async fn establish_async_connection_pool(config: &DatabaseConfig) -> AppResult<AsyncDbPool> {
    let manager =
        AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.connection_string());

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .min_idle(Some(config.min_connections))
        .connection_timeout(Duration::from_secs(config.connection_timeout))
        .build(manager)
        .await?;

    // Surface bad credentials or an unreachable host at startup
    drop(pool.get().await?);

    Ok(pool)
}
