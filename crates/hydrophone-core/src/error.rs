//! Error types for the hydrophone document service.
//!
//! Every failure the service can report has one stable kind here. Validation
//! kinds carry no payload: the message is the external identity clients match on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using hydrophone's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Status code attached to an error when it crosses the RPC boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    Unavailable,
    Internal,
}

impl std::fmt::Display for RpcCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RpcCode::InvalidArgument => "InvalidArgument",
            RpcCode::NotFound => "NotFound",
            RpcCode::Unavailable => "Unavailable",
            RpcCode::Internal => "Internal",
        };
        f.write_str(s)
    }
}

/// Core error type for hydrophone operations.
#[derive(Error, Debug)]
pub enum Error {
    // ─── Input shape ───────────────────────────────────────────────────────
    #[error("nil request")]
    NilRequest,

    #[error("nil request data")]
    NilRequestData,

    #[error("missing Document DUID")]
    MissingDuid,

    #[error("nil query arguments")]
    NilQueryArguments,

    #[error("nil query transaction")]
    NilQueryTransaction,

    #[error("nil query result")]
    NilQueryResult,

    // ─── Field validation ──────────────────────────────────────────────────
    #[error("invalid Document DUID")]
    InvalidDuid,

    #[error("invalid Document UUID")]
    InvalidUuid,

    #[error("invalid Document FUID")]
    InvalidFuid,

    #[error("invalid Document LastName")]
    InvalidLastName,

    #[error("invalid Document FirstName")]
    InvalidFirstName,

    #[error("invalid Document CallTypeName")]
    InvalidCallTypeName,

    #[error("invalid Document GroundType")]
    InvalidGroundType,

    #[error("invalid Document City")]
    InvalidCity,

    #[error("invalid Document State")]
    InvalidState,

    #[error("invalid Document Province")]
    InvalidProvince,

    #[error("invalid Document Country")]
    InvalidCountry,

    #[error("invalid Document Ocean")]
    InvalidOcean,

    #[error("invalid Document SensorType")]
    InvalidSensorType,

    #[error("invalid Document SensorName")]
    InvalidSensorName,

    #[error("invalid Document SamplingRate")]
    InvalidSamplingRate,

    #[error("invalid Document Latitude")]
    InvalidLatitude,

    #[error("invalid Document Longitude")]
    InvalidLongitude,

    #[error("nil Document ImageURLs")]
    NilImageUrls,

    #[error("nil Document AudioURLs")]
    NilAudioUrls,

    #[error("nil Document VideoURLs")]
    NilVideoUrls,

    #[error("nil Document FileURLs")]
    NilFileUrls,

    #[error("invalid Document ImageURL")]
    InvalidImageUrl,

    #[error("invalid Document AudioURL")]
    InvalidAudioUrl,

    #[error("invalid Document VideoURL")]
    InvalidVideoUrl,

    #[error("invalid Document FileURL")]
    InvalidFileUrl,

    #[error("invalid Document ImageURL type")]
    ImageKindMismatch,

    #[error("invalid Document AudioURL type")]
    AudioKindMismatch,

    #[error("invalid Document VideoURL type")]
    VideoKindMismatch,

    #[error("unreachable URI")]
    UnreachableUri,

    #[error("invalid Document RecordTimestamp")]
    InvalidRecordTimestamp,

    #[error("invalid Document CreateTimestamp")]
    InvalidCreateTimestamp,

    #[error("invalid Document UpdateTimestamp")]
    InvalidUpdateTimestamp,

    #[error("Document requires at least one image or audio URL")]
    AtLeastOneImageAudio,

    // ─── Distinct pipeline ─────────────────────────────────────────────────
    #[error("invalid distinct result")]
    InvalidDistinctResult,

    #[error("invalid distinct field name")]
    InvalidDistinctFieldName,

    // ─── Resources ─────────────────────────────────────────────────────────
    #[error("service unavailable")]
    ServiceUnavailable,

    #[error("nil database client")]
    NilDatabaseClient,

    #[error("database unavailable")]
    DatabaseUnavailable,

    #[error("Document not found")]
    DocumentNotFound,

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map the kind onto the RPC status code reported to clients.
    pub fn code(&self) -> RpcCode {
        match self {
            Error::ServiceUnavailable
            | Error::NilDatabaseClient
            | Error::DatabaseUnavailable
            | Error::Database(_) => RpcCode::Unavailable,
            Error::DocumentNotFound => RpcCode::NotFound,
            Error::Config(_) | Error::Internal(_) => RpcCode::Internal,
            _ => RpcCode::InvalidArgument,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
