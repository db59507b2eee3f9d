//! # hydrophone-db
//!
//! Document storage for the hydrophone service.
//!
//! This crate provides:
//! - Reader/writer handle management with lazy dial and ping-driven refresh
//! - Translation of the query match stage to parameterized SQL over JSONB
//! - A PostgreSQL document repository with facet (distinct) queries
//! - An in-memory repository evaluating the same match stage
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hydrophone_db::{DatabaseHandles, PgDocumentRepository, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = Arc::new(DatabaseHandles::new(
//!         "postgres://localhost/hydrophone",
//!         "postgres://localhost/hydrophone",
//!         PoolConfig::default(),
//!     ));
//!     let repo = PgDocumentRepository::new(handles);
//!     repo.ensure_schema().await?;
//!     Ok(())
//! }
//! ```
pub mod documents;
pub mod match_stage;
pub mod memory;
pub mod pool;

// Re-export core types
pub use hydrophone_core::*;

pub use documents::PgDocumentRepository;
pub use match_stage::{MatchStageQueryBuilder, QueryParam};
pub use memory::MemoryDocumentRepository;
pub use pool::{create_pool_with_config, DatabaseHandles, DbHandle, HandleRole, PoolConfig};
