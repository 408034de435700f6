//! Application state shared by every request handler.

use crate::db::AsyncDbPool;
use crate::services::Services;

/// Used with Axum's `State` extractor; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    /// Wires the PostgreSQL-backed services onto `pool`.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool);
    /// ```
    pub fn new(pool: AsyncDbPool) -> Self {
        Self::with_services(Services::new(pool))
    }

    /// Uses already built services, e.g. over the in-memory repository.
    pub fn with_services(services: Services) -> Self {
        Self { services }
    }
}
