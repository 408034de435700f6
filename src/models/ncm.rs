use crate::utils::normalize_code;
use diesel::prelude::*;

/// NCM row as stored in the `ncm` table.
///
/// Used for SELECT, INSERT and full-row UPDATE; the primary key is left out of
/// the changeset and `None` fields are written as NULL.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::ncm)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Ncm {
    pub id: String,
    pub code: String,
    pub code_no_symbols: String,
    pub description: String,
    pub initial_date: Option<String>,
    pub final_date: Option<String>,
    pub type_year_ini: Option<String>,
    pub number_ato_ini: Option<String>,
    pub year_ato_ini: Option<String>,
}

impl Ncm {
    /// Builds a record with no optional attributes, deriving `code_no_symbols`.
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let code = code.into();
        Self {
            id: id.into(),
            code_no_symbols: normalize_code(&code),
            code,
            description: description.into(),
            initial_date: None,
            final_date: None,
            type_year_ini: None,
            number_ato_ini: None,
            year_ato_ini: None,
        }
    }
}

/// Caller supplied NCM attributes, before validation.
///
/// Every field may be missing; the service decides which ones are required for
/// each operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NcmDraft {
    pub id: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub initial_date: Option<String>,
    pub final_date: Option<String>,
    pub type_year_ini: Option<String>,
    pub number_ato_ini: Option<String>,
    pub year_ato_ini: Option<String>,
}

impl NcmDraft {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Converts into a storable record under `id`, recomputing `code_no_symbols`.
    ///
    /// Missing `code`/`description` become empty strings, so callers check them
    /// beforehand.
    pub fn into_record(self, id: String) -> Ncm {
        let code = self.code.unwrap_or_default();
        Ncm {
            id,
            code_no_symbols: normalize_code(&code),
            code,
            description: self.description.unwrap_or_default(),
            initial_date: self.initial_date,
            final_date: self.final_date,
            type_year_ini: self.type_year_ini,
            number_ato_ini: self.number_ato_ini,
            year_ato_ini: self.year_ato_ini,
        }
    }
}
