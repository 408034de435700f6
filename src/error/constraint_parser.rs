use regex::Regex;
use std::sync::OnceLock;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// Structured information is taken from the constraint name when the driver
/// reports one, and from the human readable message otherwise.
pub struct ConstraintParser;

/// Compiled regex patterns for constraint parsing, cached for performance
struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    relation_name: Regex,
}

impl RegexPatterns {
    fn new() -> Self {
        Self {
            // "Key (field)=(value)"
            key_value: Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("valid key regex"),
            column_name: Regex::new(r#"column "([^"]+)""#).expect("valid column regex"),
            // "relation" in newer servers, "table" in older ones
            relation_name: Regex::new(r#"(?:relation|table) "([^"]+)""#)
                .expect("valid relation regex"),
        }
    }
}

static REGEX_PATTERNS: OnceLock<RegexPatterns> = OnceLock::new();

/// Constraint name suffixes PostgreSQL generates by default.
const SUFFIXES: [&str; 4] = ["_pkey", "_key", "_check", "_idx"];

impl ConstraintParser {
    fn patterns() -> &'static RegexPatterns {
        REGEX_PATTERNS.get_or_init(RegexPatterns::new)
    }

    /// Parses a unique constraint violation into `(entity, field, value)`.
    ///
    /// ```
    /// use codexfiscal::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"ncm_pkey\"\nDETAIL: Key (id)=(abc) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, Some("ncm_pkey"));
    /// assert_eq!(result, Some(("ncm".to_string(), "id".to_string(), "abc".to_string())));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let key_value = Self::extract_key_value_from_message(message);

        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            // The message names the real key column; the constraint name only guesses it.
            return Some(match key_value {
                Some((key_field, value)) => (entity, key_field, value),
                None => (entity, field, "duplicate_value".to_string()),
            });
        }

        let (field, value) = key_value?;
        let entity =
            Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a not-null violation into `(entity, field)`.
    ///
    /// ```
    /// use codexfiscal::error::ConstraintParser;
    ///
    /// let message = "null value in column \"code\" of relation \"ncm\" violates not-null constraint";
    /// let result = ConstraintParser::parse_not_null_violation(message, None);
    /// assert_eq!(result, Some(("ncm".to_string(), "code".to_string())));
    /// ```
    pub fn parse_not_null_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_table_from_message(message)
            .or_else(|| constraint_name.and_then(Self::parse_constraint_name).map(|(e, _)| e))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a check constraint violation into `(entity, field)`.
    pub fn parse_check_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String)> {
        if let Some(parsed) = constraint_name.and_then(Self::parse_constraint_name) {
            return Some(parsed);
        }

        let field = Self::extract_column_from_message(message)?;
        let entity =
            Self::extract_table_from_message(message).unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Splits a generated constraint name into entity and field.
    ///
    /// - `ncm_pkey` -> `("ncm", "id")`
    /// - `ncm_code_check` -> `("ncm", "code")`
    /// - `ncm_code_no_symbols_idx` -> `("ncm", "code_no_symbols")`
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let suffix = SUFFIXES.iter().find(|s| constraint_name.ends_with(*s))?;
        let stem = &constraint_name[..constraint_name.len() - suffix.len()];

        if *suffix == "_pkey" {
            return (!stem.is_empty()).then(|| (stem.to_string(), "id".to_string()));
        }

        let (entity, field) = stem.split_once('_')?;
        if entity.is_empty() || field.is_empty() {
            return None;
        }
        Some((entity.to_string(), field.to_string()))
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::patterns()
            .relation_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` detail line.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        Self::patterns().key_value.captures(message).and_then(|caps| {
            let field = caps.get(1)?.as_str().to_string();
            let value = caps.get(2)?.as_str().to_string();
            Some((field, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primary_key_violation() {
        let message = "duplicate key value violates unique constraint \"ncm_pkey\"\nDETAIL: Key (id)=(3f2a) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, Some("ncm_pkey"));
        assert_eq!(
            result,
            Some(("ncm".to_string(), "id".to_string(), "3f2a".to_string()))
        );
    }

    #[test]
    fn test_parse_unique_violation_without_constraint_name() {
        let message = "duplicate key value violates unique constraint on table \"ncm\"\nDETAIL: Key (code)=(0101.21.00) already exists.";
        let result = ConstraintParser::parse_unique_violation(message, None);
        assert_eq!(
            result,
            Some(("ncm".to_string(), "code".to_string(), "0101.21.00".to_string()))
        );
    }

    #[test]
    fn test_parse_unique_violation_without_detail() {
        let result = ConstraintParser::parse_unique_violation("duplicate", Some("ncm_code_key"));
        assert_eq!(
            result,
            Some(("ncm".to_string(), "code".to_string(), "duplicate_value".to_string()))
        );
    }

    #[test]
    fn test_parse_not_null_violation() {
        let message = "null value in column \"description\" violates not-null constraint";
        let result = ConstraintParser::parse_not_null_violation(message, None);
        assert_eq!(
            result,
            Some(("resource".to_string(), "description".to_string()))
        );
    }

    #[test]
    fn test_parse_check_violation() {
        let message = "new row for relation \"ncm\" violates check constraint \"ncm_description_check\"";
        let result = ConstraintParser::parse_check_violation(message, Some("ncm_description_check"));
        assert_eq!(
            result,
            Some(("ncm".to_string(), "description".to_string()))
        );
    }

    #[test]
    fn test_parse_constraint_name() {
        assert_eq!(
            ConstraintParser::parse_constraint_name("ncm_pkey"),
            Some(("ncm".to_string(), "id".to_string()))
        );
        assert_eq!(
            ConstraintParser::parse_constraint_name("ncm_code_no_symbols_idx"),
            Some(("ncm".to_string(), "code_no_symbols".to_string()))
        );
        assert_eq!(ConstraintParser::parse_constraint_name("ncm"), None);
        assert_eq!(ConstraintParser::parse_constraint_name("_pkey"), None);
        assert_eq!(ConstraintParser::parse_constraint_name("random_name"), None);
    }

    #[test]
    fn test_extract_helpers() {
        let message = "null value in column \"code\" of relation \"ncm\" violates not-null constraint";
        assert_eq!(
            ConstraintParser::extract_column_from_message(message),
            Some("code".to_string())
        );
        assert_eq!(
            ConstraintParser::extract_table_from_message(message),
            Some("ncm".to_string())
        );
        assert_eq!(ConstraintParser::extract_key_value_from_message(message), None);
    }

    #[test]
    fn test_graceful_parsing_failures() {
        assert_eq!(ConstraintParser::parse_unique_violation("", None), None);
        assert_eq!(ConstraintParser::parse_not_null_violation("oops", None), None);
        assert_eq!(ConstraintParser::parse_check_violation("oops", None), None);
    }
}
