//! Definitions shared between the bucket façade (`bucketd`) and its CLI (`bucketctl`).

mod format;
mod key;
mod types;

pub use format::{content_type_for, encode_component, format_bytes};
pub use key::{KeyError, validate_key};
pub use types::{
    DeletedObject, ErrorResponse, FileEntry, HealthResponse, ListResponse, SuccessResponse,
    UploadedObject,
};

/// Path of the listing endpoint.
pub const LIST_PATH: &str = "_list";
/// Path of the health endpoint.
pub const HEALTH_PATH: &str = "_health";
