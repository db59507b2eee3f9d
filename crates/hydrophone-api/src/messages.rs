//! Request and response bodies of the RPC surface.
//!
//! Request bodies are parsed by hand rather than through axum's `Json`
//! extractor so that an empty body, a body without its payload, and a
//! malformed body each map to their own error kind.

use serde::{Deserialize, Serialize};

use hydrophone_core::defaults::OK_MESSAGE;
use hydrophone_core::{Document, Error, QueryTransaction, Result, ServiceState};

/// Body of every document-carrying request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRequest {
    #[serde(default)]
    pub document: Option<Document>,
}

/// Body of the two query requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<QueryTransaction>,
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Extract the document from a raw request body.
pub fn parse_document_request(body: &[u8]) -> Result<Document> {
    if is_blank(body) {
        return Err(Error::NilRequest);
    }
    let request: DocumentRequest = serde_json::from_slice(body)?;
    request.document.ok_or(Error::NilRequestData)
}

/// Extract the query transaction from a raw request body.
pub fn parse_query_request(body: &[u8]) -> Result<QueryTransaction> {
    if is_blank(body) {
        return Err(Error::NilQueryArguments);
    }
    let request: QueryRequest = serde_json::from_slice(body)?;
    request.query.ok_or(Error::NilQueryTransaction)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: ServiceState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub document: Document,
    pub message: String,
}

impl DocumentResponse {
    pub fn ok(document: Document) -> Self {
        Self {
            document,
            message: OK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentsResponse {
    pub documents: Vec<Document>,
    pub message: String,
}

impl DocumentsResponse {
    pub fn ok(documents: Vec<Document>) -> Self {
        Self {
            documents,
            message: OK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: QueryTransaction,
    pub message: String,
}

impl QueryResponse {
    pub fn ok(query: QueryTransaction) -> Self {
        Self {
            query,
            message: OK_MESSAGE.to_string(),
        }
    }
}

/// Body of `GET`/`PUT /admin/state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBody {
    pub state: ServiceState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_request_shapes() {
        assert!(matches!(parse_document_request(b""), Err(Error::NilRequest)));
        assert!(matches!(parse_document_request(b" \n"), Err(Error::NilRequest)));
        assert!(matches!(parse_document_request(b"{}"), Err(Error::NilRequestData)));
        assert!(matches!(
            parse_document_request(b"{\"document\": null}"),
            Err(Error::NilRequestData)
        ));
        assert!(matches!(
            parse_document_request(b"{not json"),
            Err(Error::Serialization(_))
        ));

        let doc = parse_document_request(br#"{"document": {"uuid": "abc"}}"#).unwrap();
        assert_eq!(doc.uuid, "abc");
        assert!(doc.image_urls.is_none());
    }

    #[test]
    fn test_query_request_shapes() {
        assert!(matches!(parse_query_request(b""), Err(Error::NilQueryArguments)));
        assert!(matches!(parse_query_request(b"{}"), Err(Error::NilQueryTransaction)));

        let query = parse_query_request(br#"{"query": {"groundTypes": ["beach"]}}"#).unwrap();
        assert_eq!(query.ground_types, vec!["beach"]);
        assert!(query.publishers.is_empty());
    }
}
