//! NCM request/response DTOs. Field names follow the public JSON contract.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult, ValidationFieldError};
use crate::models::{Ncm, NcmDraft};
use crate::utils::validate::not_blank;

// ============================================================================
// Request DTOs
// ============================================================================

/// NCM payload for create, update and bulk insert.
///
/// Every field is optional at the JSON level; required ones are enforced by
/// the service so a missing field and a blank one produce the same error.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "codigo": "0101.21.00",
    "descricao": "Cavalos reprodutores de raça pura",
    "data_inicio": "2022-04-01",
    "tipo_ato_ini": "Res Camex",
    "numero_ato_ini": "272",
    "ano_ato_ini": "2021"
}))]
pub struct NcmRequest {
    /// Identifier; required for update, optional for bulk insert, ignored on create
    #[validate(length(max = 64, message = "id_ncm must be at most 64 characters"))]
    pub id_ncm: Option<String>,
    #[validate(length(max = 50, message = "codigo must be at most 50 characters"))]
    #[schema(max_length = 50)]
    pub codigo: Option<String>,
    pub descricao: Option<String>,
    #[validate(length(max = 255))]
    pub data_inicio: Option<String>,
    #[validate(length(max = 255))]
    pub data_fim: Option<String>,
    #[validate(length(max = 255))]
    pub tipo_ato_ini: Option<String>,
    #[validate(length(max = 255))]
    pub numero_ato_ini: Option<String>,
    #[validate(length(max = 255))]
    pub ano_ato_ini: Option<String>,
}

impl NcmRequest {
    pub fn into_draft(self) -> NcmDraft {
        NcmDraft {
            id: self.id_ncm,
            code: self.codigo,
            description: self.descricao,
            initial_date: self.data_inicio,
            final_date: self.data_fim,
            type_year_ini: self.tipo_ato_ini,
            number_ato_ini: self.numero_ato_ini,
            year_ato_ini: self.ano_ato_ini,
        }
    }
}

/// Runs the per-record rules over a bulk payload, naming fields by position.
pub fn validate_batch(requests: &[NcmRequest]) -> AppResult<()> {
    let mut errors = Vec::new();
    for (i, request) in requests.iter().enumerate() {
        if let Err(invalid) = request.validate() {
            if let AppError::ValidationErrors { errors: fields } = AppError::from(invalid) {
                errors.extend(fields.into_iter().map(|e| {
                    ValidationFieldError::new(format!("ncms[{}].{}", i, e.field), e.message)
                }));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationErrors { errors })
    }
}

/// `?text=` query for description searches.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TextQuery {
    /// Substring to look for in the description, case-insensitive
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

/// `?codes=a,b,c` query for multi-code lookups.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct CodesQuery {
    /// Comma separated NCM codes, with or without punctuation
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub codes: String,
}

impl CodesQuery {
    /// Splits on commas, dropping blank entries.
    pub fn code_list(&self) -> Vec<String> {
        self.codes
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// NCM record as returned by the API. Absent attributes are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NcmResponse {
    pub id_ncm: String,
    pub codigo: String,
    pub descricao: String,
    pub data_inicio: Option<String>,
    pub data_fim: Option<String>,
    pub tipo_ato_ini: Option<String>,
    pub numero_ato_ini: Option<String>,
    pub ano_ato_ini: Option<String>,
}

impl From<Ncm> for NcmResponse {
    fn from(ncm: Ncm) -> Self {
        Self {
            id_ncm: ncm.id,
            codigo: ncm.code,
            descricao: ncm.description,
            data_inicio: ncm.initial_date,
            data_fim: ncm.final_date,
            tipo_ato_ini: ncm.type_year_ini,
            numero_ato_ini: ncm.number_ato_ini,
            ano_ato_ini: ncm.year_ato_ini,
        }
    }
}
