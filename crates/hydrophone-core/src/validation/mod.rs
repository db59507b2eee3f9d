//! Document validation: per-field rules and the ordered document check.

pub mod document;
pub mod fields;

pub use document::{validate_document, validate_document_at, validate_has_image_or_audio};
pub use fields::*;
