use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{NCM_ENTITY, NcmRepository, new_id, prepare_batch};
use crate::error::{AppError, AppResult};
use crate::models::Ncm;

/// NCM repository backed by a vector, in insertion order.
///
/// Mirrors the PostgreSQL repository's observable behaviour, including the
/// case-insensitive literal substring search and bulk insert skipping.
#[derive(Debug, Default)]
pub struct InMemoryNcmRepository {
    records: RwLock<Vec<Ncm>>,
}

impl InMemoryNcmRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `records` as-is, without generating ids.
    pub fn with_records(records: Vec<Ncm>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn sorted_by_code(mut records: Vec<Ncm>) -> Vec<Ncm> {
    records.sort_by(|a, b| a.code.cmp(&b.code));
    records
}

#[async_trait]
impl NcmRepository for InMemoryNcmRepository {
    async fn create(&self, mut record: Ncm) -> AppResult<Ncm> {
        record.id = new_id();
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, record: Ncm) -> AppResult<Ncm> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|stored| stored.id == record.id)
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "id", &record.id))?;
        *stored = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id != id);
        if records.len() == before {
            return Err(AppError::not_found(NCM_ENTITY, "id", id));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Ncm> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "id", id))
    }

    async fn find_by_code(&self, code_normalized: &str) -> AppResult<Ncm> {
        let records = self.records.read().await;
        let matches = records
            .iter()
            .filter(|record| record.code_no_symbols == code_normalized)
            .cloned()
            .collect();
        sorted_by_code(matches)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "code", code_normalized))
    }

    async fn find_by_text(&self, text: &str) -> AppResult<Ncm> {
        self.list_by_text(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(NCM_ENTITY, "description", text))
    }

    async fn list_by_codes(&self, codes_normalized: &[String]) -> AppResult<Vec<Ncm>> {
        if codes_normalized.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.records.read().await;
        let matches = records
            .iter()
            .filter(|record| codes_normalized.contains(&record.code_no_symbols))
            .cloned()
            .collect();
        Ok(sorted_by_code(matches))
    }

    async fn list_by_text(&self, text: &str) -> AppResult<Vec<Ncm>> {
        let records = self.records.read().await;
        let matches = records
            .iter()
            .filter(|record| contains_ignore_case(&record.description, text))
            .cloned()
            .collect();
        Ok(sorted_by_code(matches))
    }

    async fn list_all(&self) -> AppResult<Vec<Ncm>> {
        Ok(sorted_by_code(self.records.read().await.clone()))
    }

    async fn bulk_insert(&self, records: Vec<Ncm>) -> AppResult<Vec<Ncm>> {
        let mut stored = self.records.write().await;
        let mut inserted = Vec::new();
        for record in prepare_batch(records) {
            if stored.iter().any(|existing| existing.id == record.id) {
                continue;
            }
            stored.push(record.clone());
            inserted.push(record);
        }
        Ok(inserted)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
