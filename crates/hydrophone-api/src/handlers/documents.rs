//! RPC handlers for the document operations.
//!
//! Each operation is `POST /rpc/<Operation>` with a JSON body. Bodies are
//! taken as raw bytes and parsed by [`crate::messages`] so that missing
//! payloads surface as their own error kinds.

use axum::{body::Bytes, extract::State, Json};

use hydrophone_core::defaults::OK_MESSAGE;
use hydrophone_core::Document;

use crate::messages::{
    parse_document_request, parse_query_request, DocumentResponse, DocumentsResponse,
    QueryResponse, StatusResponse,
};
use crate::{ApiError, AppState};

/// `GetStatus`: readiness plus a store ping.
pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.documents.get_status().await?;
    Ok(Json(StatusResponse {
        state: status,
        message: OK_MESSAGE.to_string(),
    }))
}

pub async fn create_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    let created = state.documents.create_document(doc).await?;
    Ok(Json(DocumentResponse::ok(created)))
}

pub async fn list_user_document_collection(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    let docs = state.documents.list_user_documents(&doc.uuid).await?;
    Ok(Json(DocumentsResponse::ok(docs)))
}

pub async fn update_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    let updated = state.documents.update_document(doc).await?;
    Ok(Json(DocumentResponse::ok(updated)))
}

/// `DeleteDocument`: echoes the `(duid, uuid)` that was removed.
pub async fn delete_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    state.documents.delete_document(&doc.duid, &doc.uuid).await?;
    Ok(Json(DocumentResponse::ok(Document {
        duid: doc.duid,
        uuid: doc.uuid,
        ..Default::default()
    })))
}

pub async fn add_file_metadata(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    let updated = state.documents.add_file_metadata(doc).await?;
    Ok(Json(DocumentResponse::ok(updated)))
}

pub async fn delete_file_metadata(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentResponse>, ApiError> {
    let doc = parse_document_request(&body)?;
    let updated = state.documents.delete_file_metadata(doc).await?;
    Ok(Json(DocumentResponse::ok(updated)))
}

pub async fn list_distinct_field_values(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let query = parse_query_request(&body)?;
    let facets = state.documents.list_distinct_field_values(&query).await?;
    Ok(Json(QueryResponse::ok(facets)))
}

pub async fn query_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let query = parse_query_request(&body)?;
    let docs = state.documents.query_documents(&query).await?;
    Ok(Json(DocumentsResponse::ok(docs)))
}
