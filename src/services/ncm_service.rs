//! NCM service: input validation and code normalization in front of the
//! repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{AppError, AppResult, ValidationFieldError};
use crate::models::{Ncm, NcmDraft};
use crate::repositories::NcmRepository;
use crate::utils::text::is_blank_opt;
use crate::utils::{is_blank, normalize_code};

const BLANK_REASON: &str = "must not be empty or whitespace";

fn require(field: &str, value: &str) -> AppResult<()> {
    if is_blank(value) {
        return Err(AppError::validation(field, BLANK_REASON));
    }
    Ok(())
}

/// Field errors for the attributes every stored record needs.
fn missing_fields(draft: &NcmDraft, prefix: &str) -> Vec<ValidationFieldError> {
    let mut errors = Vec::new();
    if is_blank_opt(draft.code.as_deref()) {
        errors.push(ValidationFieldError::new(format!("{prefix}codigo"), BLANK_REASON));
    }
    if is_blank_opt(draft.description.as_deref()) {
        errors.push(ValidationFieldError::new(format!("{prefix}descricao"), BLANK_REASON));
    }
    errors
}

fn check_required(draft: &NcmDraft) -> AppResult<()> {
    let mut errors = missing_fields(draft, "");
    match errors.len() {
        0 => Ok(()),
        1 => {
            let error = errors.remove(0);
            Err(AppError::validation(error.field, error.message))
        }
        _ => Err(AppError::ValidationErrors { errors }),
    }
}

/// Business operations on NCM records.
///
/// Cloning is cheap: the repository sits behind an `Arc`.
#[derive(Clone)]
pub struct NcmService {
    repo: Arc<dyn NcmRepository>,
}

impl NcmService {
    pub fn new(repo: Arc<dyn NcmRepository>) -> Self {
        Self { repo }
    }

    /// Creates a record; any caller supplied id is replaced.
    pub async fn create(&self, draft: NcmDraft) -> AppResult<Ncm> {
        check_required(&draft)?;
        let record = draft.into_record(String::new());
        let code = record.code.clone();

        let created = self
            .repo
            .create(record)
            .await
            .map_err(|e| e.context(format!("create ncm code={}", code)))?;
        tracing::info!(id = %created.id, code = %created.code, "NCM created");
        Ok(created)
    }

    /// Replaces every attribute of the record identified by `draft.id`.
    pub async fn update(&self, draft: NcmDraft) -> AppResult<Ncm> {
        let id = draft.id.clone().unwrap_or_default();
        require("id_ncm", &id)?;
        check_required(&draft)?;

        let updated = self
            .repo
            .update(draft.into_record(id.clone()))
            .await
            .map_err(|e| e.context(format!("update ncm id={}", id)))?;
        tracing::info!(id = %updated.id, "NCM updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        require("id", id)?;
        self.repo
            .delete(id)
            .await
            .map_err(|e| e.context(format!("delete ncm id={}", id)))?;
        tracing::info!(id = %id, "NCM deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Ncm> {
        require("id", id)?;
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| e.context(format!("get ncm id={}", id)))
    }

    /// Looks a record up by code, ignoring punctuation (`0101.21.00` == `01012100`).
    pub async fn get_by_code(&self, code: &str) -> AppResult<Ncm> {
        require("code", code)?;
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return Err(AppError::validation(
                "code",
                "must contain at least one letter or digit",
            ));
        }

        self.repo
            .find_by_code(&normalized)
            .await
            .map_err(|e| e.context(format!("get ncm code={}", code)))
    }

    pub async fn get_by_text(&self, text: &str) -> AppResult<Ncm> {
        require("text", text)?;
        self.repo
            .find_by_text(text)
            .await
            .map_err(|e| e.context(format!("get ncm text={}", text)))
    }

    /// Lists records matching any of `codes`, compared in normalized form.
    pub async fn list_by_codes(&self, codes: &[String]) -> AppResult<Vec<Ncm>> {
        let mut seen = HashSet::new();
        let normalized: Vec<String> = codes
            .iter()
            .map(|code| normalize_code(code))
            .filter(|code| !code.is_empty() && seen.insert(code.clone()))
            .collect();

        if normalized.is_empty() {
            return Err(AppError::validation(
                "codes",
                "at least one non-blank code is required",
            ));
        }

        self.repo
            .list_by_codes(&normalized)
            .await
            .map_err(|e| e.context(format!("list ncm codes={}", normalized.join(","))))
    }

    pub async fn list_by_text(&self, text: &str) -> AppResult<Vec<Ncm>> {
        require("text", text)?;
        self.repo
            .list_by_text(text)
            .await
            .map_err(|e| e.context(format!("list ncm text={}", text)))
    }

    pub async fn list_all(&self) -> AppResult<Vec<Ncm>> {
        self.repo.list_all().await.map_err(|e| e.context("list ncm"))
    }

    /// Validates the whole batch, then inserts it in one go.
    ///
    /// Field errors are reported per position (`ncms[2].codigo`).
    pub async fn bulk_insert(&self, drafts: Vec<NcmDraft>) -> AppResult<Vec<Ncm>> {
        if drafts.is_empty() {
            return Err(AppError::validation("ncms", "at least one record is required"));
        }

        let errors: Vec<ValidationFieldError> = drafts
            .iter()
            .enumerate()
            .flat_map(|(i, draft)| missing_fields(draft, &format!("ncms[{i}].")))
            .collect();
        if !errors.is_empty() {
            return Err(AppError::ValidationErrors { errors });
        }

        let requested = drafts.len();
        let records = drafts
            .into_iter()
            .map(|draft| {
                let id = draft.id.clone().unwrap_or_default();
                draft.into_record(id)
            })
            .collect();

        let inserted = self
            .repo
            .bulk_insert(records)
            .await
            .map_err(|e| e.context(format!("bulk insert ncm count={}", requested)))?;
        tracing::info!(requested, inserted = inserted.len(), "NCM bulk insert finished");
        Ok(inserted)
    }

    /// Checks that the datastore answers.
    pub async fn ping(&self) -> AppResult<()> {
        self.repo.ping().await
    }
}
