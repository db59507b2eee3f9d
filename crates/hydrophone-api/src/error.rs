//! RPC error envelope.
//!
//! Every failure reaches the client as `{"code": <RpcCode>, "error": <message>}`
//! with an HTTP status chosen from the code.

use axum::{http::StatusCode, response::IntoResponse, Json};
use tracing::{debug, error, warn};

use hydrophone_core::{Error, RpcCode};

/// Handler-level error wrapping a core error kind.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn code(&self) -> RpcCode {
        self.0.code()
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::NotFound => StatusCode::NOT_FOUND,
            RpcCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let status = self.status();
        let message = self.0.to_string();

        match code {
            RpcCode::InvalidArgument | RpcCode::NotFound => {
                debug!(subsystem = "api", code = %code, error = %message, "Request rejected")
            }
            RpcCode::Unavailable => {
                warn!(subsystem = "api", code = %code, error = %message, "Request refused")
            }
            RpcCode::Internal => {
                error!(subsystem = "api", code = %code, error = %message, "Request failed")
            }
        }

        let body = Json(serde_json::json!({
            "code": code.to_string(),
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_per_code() {
        assert_eq!(ApiError(Error::InvalidOcean).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError(Error::NilRequest).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError(Error::ServiceUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(Error::DatabaseUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError(Error::DocumentNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError(Error::Internal("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
