//! HTTP handlers for hydrophone-api.

pub mod admin;
pub mod documents;
