//! hydrophone-api: RPC surface of the hydrophone document service.
//!
//! Routes:
//!
//! | Route                                | Operation                        |
//! |--------------------------------------|----------------------------------|
//! | `POST /rpc/GetStatus`                | readiness and store ping         |
//! | `POST /rpc/CreateDocument`           | validate and insert              |
//! | `POST /rpc/ListUserDocumentCollection` | documents owned by a uuid      |
//! | `POST /rpc/UpdateDocument`           | validate and replace             |
//! | `POST /rpc/DeleteDocument`           | remove one document              |
//! | `POST /rpc/AddFileMetadata`          | merge URL entries                |
//! | `POST /rpc/DeleteFileMetadata`       | drop URL entries by FUID         |
//! | `POST /rpc/ListDistinctFieldValues`  | facet values over a query        |
//! | `POST /rpc/QueryDocument`            | documents matching a query       |
//! | `GET`/`PUT /admin/state`             | readiness gate                   |
//! | `GET /health`                        | liveness                         |

pub mod config;
pub mod error;
pub mod handlers;
pub mod messages;
pub mod runtime;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

pub use config::HostsConfig;
pub use error::ApiError;
pub use runtime::Runtime;
pub use services::DocumentService;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<Runtime>,
    pub documents: DocumentService,
}

impl AppState {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            documents: DocumentService::new(runtime.clone()),
            runtime,
        }
    }
}

/// Request ID generator using UUIDv7 (time-ordered) for better log correlation.
#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Assemble the router with its middleware stack.
pub fn build_router(state: AppState) -> Router {
    use handlers::{admin, documents};

    Router::new()
        .route("/rpc/GetStatus", post(documents::get_status))
        .route("/rpc/CreateDocument", post(documents::create_document))
        .route(
            "/rpc/ListUserDocumentCollection",
            post(documents::list_user_document_collection),
        )
        .route("/rpc/UpdateDocument", post(documents::update_document))
        .route("/rpc/DeleteDocument", post(documents::delete_document))
        .route("/rpc/AddFileMetadata", post(documents::add_file_metadata))
        .route("/rpc/DeleteFileMetadata", post(documents::delete_file_metadata))
        .route(
            "/rpc/ListDistinctFieldValues",
            post(documents::list_distinct_field_values),
        )
        .route("/rpc/QueryDocument", post(documents::query_document))
        .route("/admin/state", get(admin::get_state).put(admin::put_state))
        .route("/health", get(admin::health_check))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}
