//! Database access: the async connection pool and embedded migrations.

mod migrations;
mod pool;

pub use migrations::{
    MIGRATIONS, SchemaStatus, ensure_schema, pending_migrations, run_pending_migrations,
};
pub use pool::{AsyncDbPool, establish_async_connection_pool};
