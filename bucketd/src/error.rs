use std::io;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{ErrorResponse, KeyError};
use thiserror::Error;

pub const INVALID_KEY: &str = "Invalid file key";
pub const FILE_NOT_FOUND: &str = "File not found";
pub const FILE_TOO_LARGE: &str = "File size exceeds maximum allowed size";
pub const BUCKET_ERROR: &str = "Object store operation failed";
pub const INVALID_REQUEST: &str = "Invalid request";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("payload of {size} bytes exceeds the limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The store could not place the key, e.g. a segment the filesystem refuses.
    #[error("unmappable key: {0}")]
    UnmappableKey(io::Error),

    #[error("Axum error: {0}")]
    Axum(#[from] axum::Error),

    // Internal Errors
    #[error("IO error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidInput => Self::UnmappableKey(err),
            _ => Self::Io(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidKey(_) | Self::UnmappableKey(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) | Self::Axum(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) | Self::UnmappableKey(_) => INVALID_KEY,
            Self::NotFound(_) => FILE_NOT_FOUND,
            Self::PayloadTooLarge { .. } => FILE_TOO_LARGE,
            Self::MethodNotAllowed => METHOD_NOT_ALLOWED,
            Self::BadRequest(_) | Self::Axum(_) => INVALID_REQUEST,
            Self::Io(_) => BUCKET_ERROR,
        }
    }
}

/// Full error body, details included. Stored in the response extensions so
/// `attach_error_details` can publish it when the server is configured to.
#[derive(Clone, Debug)]
pub struct DetailedError(pub ErrorResponse);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Generating response for AppError: {:?}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = ErrorResponse::new(self.message(), status.as_u16());
        let detailed = body.clone().with_details(self.to_string());

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(DetailedError(detailed));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(KeyError::Empty).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("a".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::PayloadTooLarge { size: 2, limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::from(io::Error::other("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unmappable_key_is_a_client_error() {
        let err = AppError::from(io::Error::new(
            io::ErrorKind::InvalidInput,
            "key `./a.md` does not map to a path under the storage root",
        ));
        assert!(matches!(err, AppError::UnmappableKey(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), INVALID_KEY);
    }

    #[test]
    fn test_broken_body_is_a_client_error() {
        let err = AppError::from(axum::Error::new(io::Error::other("connection reset")));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), INVALID_REQUEST);
    }

    #[test]
    fn test_response_keeps_details_aside() {
        let response = AppError::from(io::Error::other("disk full")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let detailed = response.extensions().get::<DetailedError>().unwrap();
        assert_eq!(detailed.0.error, BUCKET_ERROR);
        assert_eq!(detailed.0.details.as_deref(), Some("IO error: disk full"));
    }
}
