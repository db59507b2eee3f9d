//! In-memory DocumentRepository.
//!
//! Evaluates the same match stage as the PostgreSQL repository through
//! [`Pipeline::matches`], so handlers can run without a database (tests,
//! local runs). An outage can be simulated with [`MemoryDocumentRepository::set_reachable`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use tokio::sync::RwLock;

use hydrophone_core::{
    DistinctField, Document, DocumentRepository, Error, FacetResults, Pipeline, Result,
};

pub struct MemoryDocumentRepository {
    docs: RwLock<BTreeMap<String, Document>>,
    reachable: AtomicBool,
}

impl Default for MemoryDocumentRepository {
    fn default() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            reachable: AtomicBool::new(true),
        }
    }
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// While unreachable every call fails with `DatabaseUnavailable`.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::DatabaseUnavailable)
        }
    }
}

/// Distinct facet entries over `docs`, sorted, in the layout the PostgreSQL
/// repository produces.
fn facet_values(field: DistinctField, docs: &[&Document]) -> Vec<JsonValue> {
    let distinct: BTreeSet<Vec<&str>> = docs
        .iter()
        .map(|d| match field {
            DistinctField::Publishers => {
                vec![d.publisher.last_name.as_str(), d.publisher.first_name.as_str()]
            }
            DistinctField::StudySites => vec![
                d.study_site.city.as_str(),
                d.study_site.state.as_str(),
                d.study_site.province.as_str(),
                d.study_site.country.as_str(),
            ],
            DistinctField::CallTypeNames => vec![d.call_type_name.as_str()],
            DistinctField::GroundTypes => vec![d.ground_type.as_str()],
            DistinctField::SensorTypes => vec![d.sensor_type.as_str()],
            DistinctField::SensorNames => vec![d.sensor_name.as_str()],
        })
        .collect();

    distinct
        .into_iter()
        .map(|parts| match field {
            DistinctField::Publishers | DistinctField::StudySites => json!(parts),
            _ => json!(parts[0]),
        })
        .collect()
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn ping(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn insert(&self, doc: &Document) -> Result<()> {
        self.check_reachable()?;
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc.duid) {
            return Err(Error::Internal(format!("duplicate duid {}", doc.duid)));
        }
        docs.insert(doc.duid.clone(), doc.clone());
        Ok(())
    }

    async fn get(&self, duid: &str, uuid: &str) -> Result<Option<Document>> {
        self.check_reachable()?;
        let docs = self.docs.read().await;
        Ok(docs.get(duid).filter(|d| d.uuid == uuid).cloned())
    }

    async fn list_by_owner(&self, uuid: &str) -> Result<Vec<Document>> {
        self.check_reachable()?;
        let docs = self.docs.read().await;
        Ok(docs.values().filter(|d| d.uuid == uuid).cloned().collect())
    }

    async fn replace(&self, doc: &Document) -> Result<()> {
        self.check_reachable()?;
        let mut docs = self.docs.write().await;
        match docs.get_mut(&doc.duid) {
            Some(stored) if stored.uuid == doc.uuid => {
                *stored = doc.clone();
                Ok(())
            }
            _ => Err(Error::DocumentNotFound),
        }
    }

    async fn delete(&self, duid: &str, uuid: &str) -> Result<()> {
        self.check_reachable()?;
        let mut docs = self.docs.write().await;
        match docs.get(duid) {
            Some(stored) if stored.uuid == uuid => {
                docs.remove(duid);
                Ok(())
            }
            _ => Err(Error::DocumentNotFound),
        }
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        self.check_reachable()?;
        let docs = self.docs.read().await;
        Ok(docs.values().filter(|d| pipeline.matches(d)).cloned().collect())
    }

    async fn distinct_facets(&self, pipeline: &Pipeline) -> Result<FacetResults> {
        self.check_reachable()?;
        let docs = self.docs.read().await;
        let matching: Vec<&Document> = docs.values().filter(|d| pipeline.matches(d)).collect();

        Ok(DistinctField::ALL
            .into_iter()
            .map(|field| (field.as_str().to_string(), facet_values(field, &matching)))
            .collect())
    }

    async fn close(&self) {}
}
