//! String helpers for NCM codes and caller input.

/// Strips every character that is not an ASCII letter or digit.
///
/// NCM codes are published with punctuation (`0101.21.00`), while lookups
/// are matched against this symbol-free projection.
///
/// ```
/// use codexfiscal::utils::normalize_code;
///
/// assert_eq!(normalize_code("123.45-AB"), "12345AB");
/// ```
pub fn normalize_code(code: &str) -> String {
    code.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Returns `true` when the value is empty or made only of whitespace.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Same as [`is_blank`], treating a missing value as blank.
pub fn is_blank_opt(value: Option<&str>) -> bool {
    value.is_none_or(is_blank)
}
