//! Shared helpers used across layers.

pub mod text;
pub mod validate;

pub use text::{is_blank, normalize_code};
