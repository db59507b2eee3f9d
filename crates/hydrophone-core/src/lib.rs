//! # hydrophone-core
//!
//! Core types, validation, and query construction for the hydrophone
//! bioacoustic document service.
//!
//! This crate provides the document model, the ordered field validation
//! pipeline, identifier generators, the faceted query pipeline builder, the
//! distinct-value extractor, and the concurrency primitives (service state
//! gate, per-owner locks) that the database and API crates build on.
//!
//! ## Log Level Contract
//!
//! All crates log through `tracing` with the structured fields `subsystem`
//! ("api", "db", "validation"), `component`, `op`, `duid`, `uuid`,
//! `duration_ms`, `result_count` and `error`.
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown, state changes) |
//! | DEBUG | Rejections, decision points, config choices |
//! | TRACE | Per-item iteration, lock acquisition |

pub mod defaults;
pub mod distinct;
pub mod error;
pub mod ids;
pub mod models;
pub mod probe;
pub mod query;
pub mod state;
pub mod traits;
pub mod user_locks;
pub mod validation;

// Re-export commonly used types at crate root
pub use distinct::{extract_distinct, DistinctField};
pub use error::{Error, Result, RpcCode};
pub use ids::{new_duid, new_fuid, DuidGenerator};
pub use models::*;
pub use probe::HttpUrlProbe;
pub use query::{build_pipeline, Clause, FieldPath, InFilter, Pipeline};
pub use state::ServiceStateGate;
pub use traits::*;
pub use user_locks::{UserGuard, UserLocks};
pub use validation::{validate_document, validate_document_at};
