//! Core traits for hydrophone abstractions.
//!
//! These traits define the seams between the validation/query core and its
//! collaborators (document store, URL reachability), so handlers can be
//! exercised with in-memory fakes.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::Document;
use crate::query::Pipeline;

/// Raw distinct values per facet name, as returned by the store.
///
/// String facets hold JSON strings; `Publishers` entries are 2-element arrays
/// and `StudySites` entries are 4-element arrays. A facet missing from the map
/// means the store produced no result set for it.
pub type FacetResults = BTreeMap<String, Vec<JsonValue>>;

/// Reachability check for media URLs.
#[async_trait]
pub trait UrlProbe: Send + Sync {
    /// `Ok(())` when the URL answers a GET with a status below 400.
    /// Every failure collapses into `Error::UnreachableUri`.
    async fn probe(&self, url: &str) -> Result<()>;
}

/// Persistence for documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Verify the store is reachable.
    async fn ping(&self) -> Result<()>;

    /// Insert a new document keyed by its duid.
    async fn insert(&self, doc: &Document) -> Result<()>;

    /// Fetch one document by `(duid, uuid)`.
    async fn get(&self, duid: &str, uuid: &str) -> Result<Option<Document>>;

    /// All documents owned by `uuid`, ordered by duid.
    async fn list_by_owner(&self, uuid: &str) -> Result<Vec<Document>>;

    /// Replace the stored document with the same `(duid, uuid)`.
    ///
    /// Fails with `Error::DocumentNotFound` when no such document exists.
    async fn replace(&self, doc: &Document) -> Result<()>;

    /// Delete one document by `(duid, uuid)`.
    ///
    /// Fails with `Error::DocumentNotFound` when nothing was deleted.
    async fn delete(&self, duid: &str, uuid: &str) -> Result<()>;

    /// Documents matching the pipeline's match stage, ordered by duid.
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>>;

    /// Distinct values of every facet over the documents matching the pipeline.
    async fn distinct_facets(&self, pipeline: &Pipeline) -> Result<FacetResults>;

    /// Release connections. Subsequent calls may redial.
    async fn close(&self);
}
