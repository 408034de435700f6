//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

mod ncm_service;

pub use ncm_service::NcmService;

use std::sync::Arc;

use crate::db::AsyncDbPool;
use crate::repositories::{NcmRepository, PgNcmRepository};

/// Aggregates all services for convenient access.
///
/// Designed to be held in Axum application state; cloning is cheap.
#[derive(Clone)]
pub struct Services {
    pub ncm: NcmService,
}

impl Services {
    /// Wires the PostgreSQL repositories onto `pool`.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self::with_repository(Arc::new(PgNcmRepository::new(pool)))
    }

    pub fn with_repository(repo: Arc<dyn NcmRepository>) -> Self {
        Self {
            ncm: NcmService::new(repo),
        }
    }
}
