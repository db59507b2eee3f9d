//! PostgreSQL implementation of DocumentRepository.
//!
//! Documents are stored whole as JSONB in `document.body`; `duid` and `uuid`
//! are projected into their own columns for the primary key and the owner
//! index. Reads go through the reader handle, writes through the writer.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Postgres, Row};
use tracing::{debug, info};

use hydrophone_core::{
    Document, DocumentRepository, DistinctField, Error, FacetResults, FieldPath, Pipeline, Result,
};

use crate::match_stage::{text_expr, MatchStageQueryBuilder, QueryParam};
use crate::pool::DatabaseHandles;

/// Bootstrap DDL for the document table.
const SCHEMA_SQL: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS document (
        duid TEXT PRIMARY KEY,
        uuid TEXT NOT NULL,
        body JSONB NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS document_uuid_idx ON document (uuid)",
];

pub struct PgDocumentRepository {
    handles: Arc<DatabaseHandles>,
}

impl PgDocumentRepository {
    pub fn new(handles: Arc<DatabaseHandles>) -> Self {
        Self { handles }
    }

    /// Create the document table and owner index if missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let pool = self.handles.writer().pool().await?;
        for statement in SCHEMA_SQL {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(Error::Database)?;
        }
        info!(
            subsystem = "db",
            component = "documents",
            op = "ensure_schema",
            "Document table ready"
        );
        Ok(())
    }

    fn row_to_document(row: &PgRow) -> Result<Document> {
        let Json(doc) = row
            .try_get::<Json<Document>, _>("body")
            .map_err(Error::Database)?;
        Ok(doc)
    }

    /// Select expression yielding one distinct value per facet entry.
    ///
    /// Composite facets come back as positional arrays, matching the layout
    /// `extract_distinct` reads.
    fn facet_expr(field: DistinctField) -> String {
        let array = |paths: &[FieldPath]| {
            let parts: Vec<String> = paths.iter().map(|p| text_expr(*p)).collect();
            format!("jsonb_build_array({})", parts.join(", "))
        };
        let scalar = |path: FieldPath| format!("to_jsonb({})", text_expr(path));

        match field {
            DistinctField::Publishers => {
                array(&[FieldPath::PublisherLastName, FieldPath::PublisherFirstName])
            }
            DistinctField::StudySites => array(&[
                FieldPath::StudySiteCity,
                FieldPath::StudySiteState,
                FieldPath::StudySiteProvince,
                FieldPath::StudySiteCountry,
            ]),
            DistinctField::CallTypeNames => scalar(FieldPath::CallTypeName),
            DistinctField::GroundTypes => scalar(FieldPath::GroundType),
            DistinctField::SensorTypes => scalar(FieldPath::SensorType),
            DistinctField::SensorNames => scalar(FieldPath::SensorName),
        }
    }
}

fn bind_params<'q>(
    mut q: Query<'q, Postgres, PgArguments>,
    params: &'q [QueryParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        q = match param {
            QueryParam::BigInt(v) => q.bind(v),
            QueryParam::String(s) => q.bind(s),
            QueryParam::StringArray(arr) => q.bind(arr),
        };
    }
    q
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn ping(&self) -> Result<()> {
        self.handles.ping().await
    }

    async fn insert(&self, doc: &Document) -> Result<()> {
        let pool = self.handles.writer().pool().await?;
        sqlx::query("INSERT INTO document (duid, uuid, body) VALUES ($1, $2, $3)")
            .bind(&doc.duid)
            .bind(&doc.uuid)
            .bind(Json(doc))
            .execute(&pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert",
            duid = %doc.duid,
            uuid = %doc.uuid,
            "Document inserted"
        );
        Ok(())
    }

    async fn get(&self, duid: &str, uuid: &str) -> Result<Option<Document>> {
        let pool = self.handles.reader().pool().await?;
        let row = sqlx::query("SELECT body FROM document WHERE duid = $1 AND uuid = $2")
            .bind(duid)
            .bind(uuid)
            .fetch_optional(&pool)
            .await
            .map_err(Error::Database)?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn list_by_owner(&self, uuid: &str) -> Result<Vec<Document>> {
        let pool = self.handles.reader().pool().await?;
        let rows = sqlx::query("SELECT body FROM document WHERE uuid = $1 ORDER BY duid")
            .bind(uuid)
            .fetch_all(&pool)
            .await
            .map_err(Error::Database)?;

        rows.iter().map(Self::row_to_document).collect()
    }

    async fn replace(&self, doc: &Document) -> Result<()> {
        let pool = self.handles.writer().pool().await?;
        let result = sqlx::query("UPDATE document SET body = $3 WHERE duid = $1 AND uuid = $2")
            .bind(&doc.duid)
            .bind(&doc.uuid)
            .bind(Json(doc))
            .execute(&pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound);
        }
        debug!(
            subsystem = "db",
            component = "documents",
            op = "replace",
            duid = %doc.duid,
            "Document replaced"
        );
        Ok(())
    }

    async fn delete(&self, duid: &str, uuid: &str) -> Result<()> {
        let pool = self.handles.writer().pool().await?;
        let result = sqlx::query("DELETE FROM document WHERE duid = $1 AND uuid = $2")
            .bind(duid)
            .bind(uuid)
            .execute(&pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound);
        }
        debug!(subsystem = "db", component = "documents", op = "delete", duid, "Document deleted");
        Ok(())
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>> {
        let start = Instant::now();
        let pool = self.handles.reader().pool().await?;
        let (where_clause, params) = MatchStageQueryBuilder::new(pipeline, 0).build();
        let sql = format!("SELECT body FROM document WHERE {where_clause} ORDER BY duid");

        let rows = bind_params(sqlx::query(&sql), &params)
            .fetch_all(&pool)
            .await
            .map_err(Error::Database)?;
        let docs = rows.iter().map(Self::row_to_document).collect::<Result<Vec<_>>>()?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "aggregate",
            result_count = docs.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Match stage evaluated"
        );
        Ok(docs)
    }

    async fn distinct_facets(&self, pipeline: &Pipeline) -> Result<FacetResults> {
        let start = Instant::now();
        let pool = self.handles.reader().pool().await?;
        let (where_clause, params) = MatchStageQueryBuilder::new(pipeline, 0).build();

        let mut facets = FacetResults::new();
        for field in DistinctField::ALL {
            let sql = format!(
                "SELECT DISTINCT {} AS value FROM document WHERE {} ORDER BY value",
                Self::facet_expr(field),
                where_clause
            );
            let rows = bind_params(sqlx::query(&sql), &params)
                .fetch_all(&pool)
                .await
                .map_err(Error::Database)?;
            let values = rows
                .iter()
                .map(|row| row.try_get::<JsonValue, _>("value").map_err(Error::Database))
                .collect::<Result<Vec<_>>>()?;
            facets.insert(field.as_str().to_string(), values);
        }

        debug!(
            subsystem = "db",
            component = "documents",
            op = "distinct_facets",
            duration_ms = start.elapsed().as_millis() as u64,
            "Facet values collected"
        );
        Ok(facets)
    }

    async fn close(&self) {
        self.handles.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_expr_composites_are_positional_arrays() {
        assert_eq!(
            PgDocumentRepository::facet_expr(DistinctField::Publishers),
            concat!(
                "jsonb_build_array(body #>> '{publisherName,lastName}', ",
                "body #>> '{publisherName,firstName}')"
            )
        );
        let sites = PgDocumentRepository::facet_expr(DistinctField::StudySites);
        assert!(sites.starts_with("jsonb_build_array(body #>> '{studySite,city}'"));
        assert!(sites.ends_with("body #>> '{studySite,country}')"));
    }

    #[test]
    fn test_facet_expr_scalars_are_json_strings() {
        assert_eq!(
            PgDocumentRepository::facet_expr(DistinctField::SensorNames),
            "to_jsonb(body #>> '{sensorName}')"
        );
    }
}
