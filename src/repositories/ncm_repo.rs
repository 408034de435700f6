//! PostgreSQL NCM repository built on diesel_async.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use async_trait::async_trait;

use super::{NCM_ENTITY, NcmRepository, like_pattern, new_id, prepare_batch};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::Ncm;
use crate::schema::ncm;

/// Rows per INSERT statement. Nine bind parameters per row keeps each
/// statement under the PostgreSQL limit of 65535 parameters.
pub const BULK_CHUNK_SIZE: usize = 5000;

fn db_error(operation: &'static str) -> impl FnOnce(diesel::result::Error) -> AppError {
    move |error| DatabaseErrorConverter::convert_diesel_error(error, operation)
}

/// NCM repository holding an async connection pool.
///
/// `AsyncDbPool` wraps an `Arc`, so cloning the repository is cheap.
#[derive(Clone)]
pub struct PgNcmRepository {
    pool: AsyncDbPool,
}

impl PgNcmRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NcmRepository for PgNcmRepository {
    async fn create(&self, mut record: Ncm) -> AppResult<Ncm> {
        record.id = new_id();
        let mut conn = self.pool.get().await?;

        diesel::insert_into(ncm::table)
            .values(&record)
            .returning(Ncm::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(db_error("insert ncm"))
    }

    async fn update(&self, record: Ncm) -> AppResult<Ncm> {
        let mut conn = self.pool.get().await?;

        diesel::update(ncm::table.find(&record.id))
            .set(&record)
            .returning(Ncm::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(db_error("update ncm"))?
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "id", &record.id))
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        let affected = diesel::delete(ncm::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(db_error("delete ncm"))?;

        if affected == 0 {
            return Err(AppError::not_found(NCM_ENTITY, "id", id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Ncm> {
        let mut conn = self.pool.get().await?;

        ncm::table
            .find(id)
            .select(Ncm::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_error("find ncm by id"))?
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "id", id))
    }

    async fn find_by_code(&self, code_normalized: &str) -> AppResult<Ncm> {
        let mut conn = self.pool.get().await?;

        ncm::table
            .filter(ncm::code_no_symbols.eq(code_normalized))
            .order(ncm::code.asc())
            .select(Ncm::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_error("find ncm by code"))?
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "code", code_normalized))
    }

    async fn find_by_text(&self, text: &str) -> AppResult<Ncm> {
        let mut conn = self.pool.get().await?;

        ncm::table
            .filter(ncm::description.ilike(like_pattern(text)))
            .order(ncm::code.asc())
            .select(Ncm::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_error("find ncm by text"))?
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "description", text))
    }

    async fn list_by_codes(&self, codes_normalized: &[String]) -> AppResult<Vec<Ncm>> {
        if codes_normalized.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        ncm::table
            .filter(ncm::code_no_symbols.eq_any(codes_normalized))
            .order(ncm::code.asc())
            .select(Ncm::as_select())
            .load(&mut conn)
            .await
            .map_err(db_error("list ncm by codes"))
    }

    async fn list_by_text(&self, text: &str) -> AppResult<Vec<Ncm>> {
        let mut conn = self.pool.get().await?;

        ncm::table
            .filter(ncm::description.ilike(like_pattern(text)))
            .order(ncm::code.asc())
            .select(Ncm::as_select())
            .load(&mut conn)
            .await
            .map_err(db_error("list ncm by text"))
    }

    async fn list_all(&self) -> AppResult<Vec<Ncm>> {
        let mut conn = self.pool.get().await?;

        ncm::table
            .order(ncm::code.asc())
            .select(Ncm::as_select())
            .load(&mut conn)
            .await
            .map_err(db_error("list ncm"))
    }

    async fn bulk_insert(&self, records: Vec<Ncm>) -> AppResult<Vec<Ncm>> {
        let records = prepare_batch(records);
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        let mut inserted = Vec::with_capacity(records.len());
        for chunk in records.chunks(BULK_CHUNK_SIZE) {
            let rows = diesel::insert_into(ncm::table)
                .values(chunk)
                .on_conflict(ncm::id)
                .do_nothing()
                .returning(Ncm::as_returning())
                .get_results(&mut conn)
                .await
                .map_err(db_error("bulk insert ncm"))?;
            tracing::debug!(requested = chunk.len(), inserted = rows.len(), "NCM chunk inserted");
            inserted.extend(rows);
        }
        Ok(inserted)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(db_error("ping database"))?;
        Ok(())
    }
}
