//! Repository layer for data access operations.
//!
//! [`NcmRepository`] is the seam between the service and the datastore. The
//! PostgreSQL implementation is used in production; the in-memory one backs
//! router tests and local experiments.

mod memory;
mod ncm_repo;

pub use memory::InMemoryNcmRepository;
pub use ncm_repo::PgNcmRepository;

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::Ncm;
use crate::utils::is_blank;

/// Entity name used in not-found and duplicate errors.
pub const NCM_ENTITY: &str = "ncm";

/// Data access for NCM records. Each call is a single round trip.
#[async_trait]
pub trait NcmRepository: Send + Sync {
    /// Inserts `record` under a freshly generated id and returns the stored row.
    async fn create(&self, record: Ncm) -> AppResult<Ncm>;

    /// Replaces every mutable column of the row with `record.id`.
    async fn update(&self, record: Ncm) -> AppResult<Ncm>;

    async fn delete(&self, id: &str) -> AppResult<()>;

    async fn find_by_id(&self, id: &str) -> AppResult<Ncm>;

    /// Point lookup on the normalized code column.
    async fn find_by_code(&self, code_normalized: &str) -> AppResult<Ncm>;

    /// First record whose description contains `text`, ignoring case.
    async fn find_by_text(&self, text: &str) -> AppResult<Ncm>;

    /// Every record whose normalized code is in `codes_normalized`.
    ///
    /// An empty slice yields an empty list without touching the datastore.
    async fn list_by_codes(&self, codes_normalized: &[String]) -> AppResult<Vec<Ncm>>;

    async fn list_by_text(&self, text: &str) -> AppResult<Vec<Ncm>>;

    /// All records ordered by code.
    async fn list_all(&self) -> AppResult<Vec<Ncm>>;

    /// Inserts many records, skipping ids that already exist.
    ///
    /// Returns only the rows that were actually written.
    async fn bulk_insert(&self, records: Vec<Ncm>) -> AppResult<Vec<Ncm>>;

    async fn ping(&self) -> AppResult<()>;
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fills blank ids and drops later records that repeat an id of the batch.
pub(crate) fn prepare_batch(records: Vec<Ncm>) -> Vec<Ncm> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .map(|mut record| {
            if is_blank(&record.id) {
                record.id = new_id();
            }
            record
        })
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

/// Escapes LIKE metacharacters and wraps the text for a substring match.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
