use std::collections::BTreeMap;
use std::ops::Bound;

use crate::storage::{ObjectInfo, ObjectListing, ObjectMetadata, ObjectStore, StoredObject, etag_of};

use bytes::Bytes;
use chrono::Utc;
use tokio::io;
use tokio::sync::RwLock;

/// Keeps every object in memory. Used for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, key: &str) -> io::Result<Option<StoredObject>> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> io::Result<ObjectInfo> {
        let info = ObjectInfo {
            key: key.to_string(),
            size: body.len() as u64,
            uploaded: Utc::now(),
            etag: etag_of(&body),
        };
        let object = StoredObject {
            info: info.clone(),
            metadata,
            body,
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(info)
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, limit: usize, after: Option<&str>) -> io::Result<ObjectListing> {
        let start = match after {
            Some(after) => Bound::Excluded(after),
            None => Bound::Unbounded,
        };
        let objects = self
            .objects
            .read()
            .await
            .range::<str, _>((start, Bound::Unbounded))
            .map(|(_, o)| o.info.clone())
            .collect();
        Ok(ObjectListing::from_sorted(objects, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_round() {
        let store = MemoryStore::new();
        store
            .put("b", Bytes::from_static(b"2"), ObjectMetadata::default())
            .await
            .unwrap();
        store
            .put("a", Bytes::from_static(b"1"), ObjectMetadata::default())
            .await
            .unwrap();

        let listing = store.list(1, None).await.unwrap();
        assert_eq!(listing.objects[0].key, "a");
        assert!(listing.truncated);
        assert_eq!(listing.cursor.as_deref(), Some("a"));

        let next = store.list(1, listing.cursor.as_deref()).await.unwrap();
        assert_eq!(next.objects[0].key, "b");
        assert!(!next.truncated);

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        assert_eq!(store.len().await, 1);
        assert!(store.get("a").await.unwrap().is_none());
    }
}
