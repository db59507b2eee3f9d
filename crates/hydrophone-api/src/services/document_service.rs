//! The nine document operations, independent of the HTTP surface.
//!
//! ## Flow
//!
//! Mutations: readiness gate, identifier shape checks, owner lock, document
//! validation, identifier assignment, store write. The owner lock is held
//! until the write finishes, so mutations for one owner never interleave.
//!
//! Reads: readiness gate, then the store. Facet queries additionally project
//! each facet's raw values into the result envelope.
//!
//! ## Timestamps
//!
//! - Create: `createTimestamp` defaults to now when zero.
//! - Update: `createTimestamp` is carried over from the stored document and
//!   `updateTimestamp` becomes now.
//! - File metadata changes also stamp `updateTimestamp`.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use hydrophone_core::validation::{
    validate_duid, validate_has_image_or_audio, validate_url_map, validate_uuid,
};
use hydrophone_core::{
    build_pipeline, extract_distinct, new_duid, new_fuid, validate_document_at, DistinctField,
    Document, Error, MediaKind, QueryTransaction, Result, ServiceState, UrlMap,
};

use crate::runtime::Runtime;

/// Replace blank FUID keys with freshly generated ones.
fn fill_blank_fuids(map: &mut UrlMap) {
    let blanks: Vec<String> = map
        .keys()
        .filter(|k| k.trim().is_empty())
        .cloned()
        .collect();
    for key in blanks {
        if let Some(url) = map.remove(&key) {
            map.insert(new_fuid(), url);
        }
    }
}

fn fill_document_fuids(doc: &mut Document) {
    for kind in MediaKind::ALL {
        if let Some(map) = doc.urls_mut(kind).as_mut() {
            fill_blank_fuids(map);
        }
    }
}

/// True when any of the document's URL maps already holds `fuid`.
fn fuid_in_use(doc: &Document, fuid: &str) -> bool {
    MediaKind::ALL
        .into_iter()
        .any(|kind| doc.urls(kind).is_some_and(|map| map.contains_key(fuid)))
}

/// True when the request carries at least one `(fuid, url)` entry.
fn has_url_entries(doc: &Document) -> bool {
    MediaKind::ALL
        .into_iter()
        .any(|kind| doc.urls(kind).is_some_and(|map| !map.is_empty()))
}

/// Duid must be present for operations on an existing document.
fn require_duid(duid: &str) -> Result<()> {
    if duid.trim().is_empty() {
        return Err(Error::MissingDuid);
    }
    validate_duid(duid)
}

#[derive(Clone)]
pub struct DocumentService {
    runtime: Arc<Runtime>,
}

impl DocumentService {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Readiness, including a round trip to the store.
    pub async fn get_status(&self) -> Result<ServiceState> {
        self.runtime.gate.ensure_available()?;
        self.runtime.repo.ping().await?;
        Ok(ServiceState::Available)
    }

    /// Validate and insert a new document; the returned copy carries its duid.
    pub async fn create_document(&self, mut doc: Document) -> Result<Document> {
        let rt = &self.runtime;
        rt.gate.ensure_available()?;
        validate_duid(&doc.duid)?;
        validate_uuid(&doc.uuid)?;

        let start = Instant::now();
        let _guard = rt.locks.lock(&doc.uuid).await;

        fill_document_fuids(&mut doc);
        let now = Utc::now().timestamp();
        if doc.create_timestamp == 0 {
            doc.create_timestamp = now;
        }
        validate_document_at(&doc, rt.probe.as_ref(), now).await?;

        doc.duid = new_duid();
        rt.repo.insert(&doc).await?;

        info!(
            subsystem = "api",
            component = "documents",
            op = "create",
            duid = %doc.duid,
            uuid = %doc.uuid,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document created"
        );
        Ok(doc)
    }

    /// All documents owned by `uuid`.
    pub async fn list_user_documents(&self, uuid: &str) -> Result<Vec<Document>> {
        self.runtime.gate.ensure_available()?;
        validate_uuid(uuid)?;

        let docs = self.runtime.repo.list_by_owner(uuid).await?;
        debug!(
            subsystem = "api",
            component = "documents",
            op = "list",
            uuid,
            result_count = docs.len(),
            "Listed owner documents"
        );
        Ok(docs)
    }

    /// Replace the mutable fields of an existing document.
    pub async fn update_document(&self, mut doc: Document) -> Result<Document> {
        let rt = &self.runtime;
        rt.gate.ensure_available()?;
        require_duid(&doc.duid)?;
        validate_uuid(&doc.uuid)?;

        let start = Instant::now();
        let _guard = rt.locks.lock(&doc.uuid).await;

        let stored = rt
            .repo
            .get(&doc.duid, &doc.uuid)
            .await?
            .ok_or(Error::DocumentNotFound)?;

        fill_document_fuids(&mut doc);
        let now = Utc::now().timestamp();
        doc.create_timestamp = stored.create_timestamp;
        doc.update_timestamp = now;
        validate_document_at(&doc, rt.probe.as_ref(), now).await?;

        rt.repo.replace(&doc).await?;

        info!(
            subsystem = "api",
            component = "documents",
            op = "update",
            duid = %doc.duid,
            uuid = %doc.uuid,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document updated"
        );
        Ok(doc)
    }

    /// Remove one document.
    pub async fn delete_document(&self, duid: &str, uuid: &str) -> Result<()> {
        let rt = &self.runtime;
        rt.gate.ensure_available()?;
        require_duid(duid)?;
        validate_uuid(uuid)?;

        let _guard = rt.locks.lock(uuid).await;
        rt.repo.delete(duid, uuid).await?;

        info!(
            subsystem = "api",
            component = "documents",
            op = "delete",
            duid,
            uuid,
            "Document deleted"
        );
        Ok(())
    }

    /// Merge the request's URL entries into the stored document's maps.
    ///
    /// New entries are checked with their map's validator before anything is
    /// merged, so a rejected request leaves the document untouched. A FUID
    /// already present in any of the document's maps is refused; entries are
    /// only ever added, never replaced.
    pub async fn add_file_metadata(&self, mut request: Document) -> Result<Document> {
        let rt = &self.runtime;
        rt.gate.ensure_available()?;
        require_duid(&request.duid)?;
        validate_uuid(&request.uuid)?;
        if !has_url_entries(&request) {
            return Err(Error::NilRequestData);
        }

        let _guard = rt.locks.lock(&request.uuid).await;
        let mut stored = rt
            .repo
            .get(&request.duid, &request.uuid)
            .await?
            .ok_or(Error::DocumentNotFound)?;

        fill_document_fuids(&mut request);
        let mut additions: Vec<(MediaKind, UrlMap)> = Vec::new();
        for kind in MediaKind::ALL {
            let Some(entries) = request.urls_mut(kind).take() else {
                continue;
            };
            if entries.is_empty() {
                continue;
            }
            let taken = entries.keys().find(|fuid| {
                fuid_in_use(&stored, fuid)
                    || additions.iter().any(|(_, earlier)| earlier.contains_key(*fuid))
            });
            if let Some(fuid) = taken {
                debug!(
                    subsystem = "api",
                    component = "documents",
                    op = "add_file_metadata",
                    duid = %stored.duid,
                    fuid = %fuid,
                    "FUID already assigned"
                );
                return Err(Error::InvalidFuid);
            }
            validate_url_map(kind, Some(&entries), rt.probe.as_ref()).await?;
            additions.push((kind, entries));
        }

        let added: usize = additions.iter().map(|(_, e)| e.len()).sum();
        for (kind, entries) in additions {
            stored.urls_mut(kind).get_or_insert_with(UrlMap::new).extend(entries);
        }
        validate_has_image_or_audio(&stored)?;

        stored.update_timestamp = Utc::now().timestamp();
        rt.repo.replace(&stored).await?;

        info!(
            subsystem = "api",
            component = "documents",
            op = "add_file_metadata",
            duid = %stored.duid,
            result_count = added,
            "File metadata added"
        );
        Ok(stored)
    }

    /// Drop the request's FUIDs from the stored document's maps.
    ///
    /// Unknown FUIDs are ignored. The change is refused when it would leave
    /// the document without any image or audio entry.
    pub async fn delete_file_metadata(&self, request: Document) -> Result<Document> {
        let rt = &self.runtime;
        rt.gate.ensure_available()?;
        require_duid(&request.duid)?;
        validate_uuid(&request.uuid)?;

        let _guard = rt.locks.lock(&request.uuid).await;
        let mut stored = rt
            .repo
            .get(&request.duid, &request.uuid)
            .await?
            .ok_or(Error::DocumentNotFound)?;

        let mut removed = 0usize;
        for kind in MediaKind::ALL {
            let (Some(fuids), Some(map)) = (request.urls(kind), stored.urls_mut(kind).as_mut())
            else {
                continue;
            };
            for fuid in fuids.keys() {
                if map.remove(fuid).is_some() {
                    removed += 1;
                }
            }
        }
        validate_has_image_or_audio(&stored)?;

        stored.update_timestamp = Utc::now().timestamp();
        rt.repo.replace(&stored).await?;

        info!(
            subsystem = "api",
            component = "documents",
            op = "delete_file_metadata",
            duid = %stored.duid,
            result_count = removed,
            "File metadata deleted"
        );
        Ok(stored)
    }

    /// Documents matching the query's filters.
    pub async fn query_documents(&self, query: &QueryTransaction) -> Result<Vec<Document>> {
        self.runtime.gate.ensure_available()?;
        let pipeline = build_pipeline(query);
        self.runtime.repo.aggregate(&pipeline).await
    }

    /// Distinct values of the six facets over the documents matching `query`.
    pub async fn list_distinct_field_values(
        &self,
        query: &QueryTransaction,
    ) -> Result<QueryTransaction> {
        self.runtime.gate.ensure_available()?;
        let pipeline = build_pipeline(query);
        let facets = self.runtime.repo.distinct_facets(&pipeline).await?;

        let mut result = QueryTransaction::default();
        for field in DistinctField::ALL {
            let raw = facets.get(field.as_str()).ok_or(Error::NilQueryResult)?;
            if raw.is_empty() {
                continue;
            }
            extract_distinct(&mut result, field.as_str(), raw)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_blank_fuids() {
        let mut map = UrlMap::new();
        map.insert("".into(), "https://x.org/a.png".into());
        map.insert("4ff30392-8ec8-45a4-ba94-5e22c4a686de".into(), "https://x.org/b.png".into());
        fill_blank_fuids(&mut map);

        assert_eq!(map.len(), 2);
        assert!(map.keys().all(|k| validate_fuid_ok(k)));
        assert!(map.values().any(|v| v.ends_with("a.png")));
    }

    fn validate_fuid_ok(key: &str) -> bool {
        hydrophone_core::validation::validate_fuid(key).is_ok()
    }

    #[test]
    fn test_fuid_in_use_spans_every_map() {
        let mut doc = Document::default();
        let mut files = UrlMap::new();
        files.insert("4ff30392-8ec8-45a4-ba94-5e22c4a686de".into(), "https://x.org/a.pdf".into());
        doc.file_urls = Some(files);

        assert!(fuid_in_use(&doc, "4ff30392-8ec8-45a4-ba94-5e22c4a686de"));
        assert!(!fuid_in_use(&doc, "4ff30392-8ec8-45a4-ba94-5e22c4a686df"));
        assert!(has_url_entries(&doc));

        doc.file_urls = Some(UrlMap::new());
        doc.image_urls = None;
        assert!(!has_url_entries(&doc));
    }

    #[test]
    fn test_require_duid() {
        assert!(matches!(require_duid(""), Err(Error::MissingDuid)));
        assert!(matches!(require_duid("  "), Err(Error::MissingDuid)));
        assert!(matches!(require_duid("short"), Err(Error::InvalidDuid)));
        assert!(require_duid(&new_duid()).is_ok());
    }
}
