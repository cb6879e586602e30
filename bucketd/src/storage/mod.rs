use bytes::Bytes;
use chrono::{DateTime, Utc};
use common::FileEntry;
use tokio::io;

pub mod driver;
pub mod paths;

/// Metadata kept next to the object body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub uploaded: DateTime<Utc>,
    pub etag: String,
}

impl From<ObjectInfo> for FileEntry {
    fn from(info: ObjectInfo) -> Self {
        FileEntry {
            key: info.key,
            size: info.size,
            uploaded: info.uploaded,
            etag: info.etag,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub info: ObjectInfo,
    pub metadata: ObjectMetadata,
    pub body: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct ObjectListing {
    pub objects: Vec<ObjectInfo>,
    pub truncated: bool,
    /// Last key returned when the listing was cut short.
    pub cursor: Option<String>,
}

impl ObjectListing {
    /// Builds a listing from every object, keeping the first `limit` keys in order.
    pub fn from_sorted(mut objects: Vec<ObjectInfo>, limit: usize) -> Self {
        let truncated = objects.len() > limit;
        objects.truncate(limit);
        let cursor = if truncated {
            objects.last().map(|o| o.key.clone())
        } else {
            None
        };
        Self {
            objects,
            truncated,
            cursor,
        }
    }
}

/// The bucket behind the façade. Keys reaching a store are already validated.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> io::Result<Option<StoredObject>>;
    async fn put(&self, key: &str, body: Bytes, metadata: ObjectMetadata)
    -> io::Result<ObjectInfo>;
    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> io::Result<()>;
    /// At most `limit` objects in key order, starting after the key `after`.
    async fn list(&self, limit: usize, after: Option<&str>) -> io::Result<ObjectListing>;
}

pub fn etag_of(body: &[u8]) -> String {
    format!("{:x}", md5::compute(body))
}
