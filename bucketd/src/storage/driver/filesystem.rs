use std::path::{Path, PathBuf};

use crate::storage::paths::{DATA_FILE, PathManager};
use crate::storage::{ObjectInfo, ObjectListing, ObjectMetadata, ObjectStore, StoredObject, etag_of};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{create_dir_all, read, remove_dir, remove_file, write};
use tokio::io;
use walkdir::WalkDir;

/// Sidecar written next to every object body.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct MetaFile {
    content_type: Option<String>,
    etag: String,
    uploaded: DateTime<Utc>,
}

pub struct FilesystemStore {
    path_manager: PathManager,
}

impl FilesystemStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        FilesystemStore {
            path_manager: PathManager::new(root),
        }
    }

    async fn create_path(&self, path: PathBuf) -> io::Result<PathBuf> {
        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }
        Ok(path)
    }

    async fn read_meta(&self, key: &str) -> io::Result<Option<MetaFile>> {
        let path = self.path_manager.object_meta_path(key)?;
        match read(path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw).ok()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removes now-empty directories between `path` and `stop`.
    async fn prune_empty_parents(path: &Path, stop: &Path) {
        let mut current = path.parent();
        while let Some(dir) = current {
            if dir == stop || !dir.starts_with(stop) {
                break;
            }
            if remove_dir(dir).await.is_err() {
                break;
            }
            current = dir.parent();
        }
    }
}

fn remove_if_exists(res: io::Result<()>) -> io::Result<()> {
    match res {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[async_trait::async_trait]
impl ObjectStore for FilesystemStore {
    async fn get(&self, key: &str) -> io::Result<Option<StoredObject>> {
        let data_path = self.path_manager.object_data_path(key)?;
        let body = match read(&data_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let (content_type, etag, uploaded) = match self.read_meta(key).await? {
            Some(meta) => (meta.content_type, meta.etag, meta.uploaded),
            None => {
                // Bodies copied into the root by hand have no sidecar.
                let modified = tokio::fs::metadata(&data_path).await?.modified()?;
                (None, etag_of(&body), DateTime::<Utc>::from(modified))
            }
        };

        Ok(Some(StoredObject {
            info: ObjectInfo {
                key: key.to_string(),
                size: body.len() as u64,
                uploaded,
                etag,
            },
            metadata: ObjectMetadata { content_type },
            body: Bytes::from(body),
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> io::Result<ObjectInfo> {
        let data_path = self
            .create_path(self.path_manager.object_data_path(key)?)
            .await?;
        let meta_path = self.path_manager.object_meta_path(key)?;

        let meta = MetaFile {
            content_type: metadata.content_type,
            etag: etag_of(&body),
            uploaded: Utc::now(),
        };
        write(&data_path, &body).await?;
        write(&meta_path, serde_json::to_vec(&meta)?).await?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: body.len() as u64,
            uploaded: meta.uploaded,
            etag: meta.etag,
        })
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        let data_path = self.path_manager.object_data_path(key)?;
        let meta_path = self.path_manager.object_meta_path(key)?;

        remove_if_exists(remove_file(&data_path).await)?;
        remove_if_exists(remove_file(&meta_path).await)?;

        // Directories still holding longer keys stay.
        Self::prune_empty_parents(&data_path, &self.path_manager.objects_path()).await;
        Ok(())
    }

    async fn list(&self, limit: usize, after: Option<&str>) -> io::Result<ObjectListing> {
        let path_manager = self.path_manager.clone();
        let after = after.map(str::to_string);
        tokio::task::spawn_blocking(move || walk_objects(&path_manager, limit, after.as_deref()))
            .await
            .map_err(io::Error::other)?
    }
}

fn walk_objects(
    path_manager: &PathManager,
    limit: usize,
    after: Option<&str>,
) -> io::Result<ObjectListing> {
    let root = path_manager.objects_path();
    if !root.exists() {
        return Ok(ObjectListing::default());
    }

    let mut objects = vec![];
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() || entry.file_name() != DATA_FILE {
            continue;
        }
        let Some(key) = path_manager.key_for(entry.path()) else {
            tracing::warn!("skipping unmappable object path {}", entry.path().display());
            continue;
        };

        let meta = path_manager
            .object_meta_path(&key)
            .ok()
            .and_then(|p| std::fs::read(p).ok())
            .and_then(|raw| serde_json::from_slice::<MetaFile>(&raw).ok());
        let stat = entry.metadata().map_err(io::Error::other)?;
        let (etag, uploaded) = match meta {
            Some(meta) => (meta.etag, meta.uploaded),
            None => (String::new(), DateTime::<Utc>::from(stat.modified()?)),
        };

        objects.push(ObjectInfo {
            key,
            size: stat.len(),
            uploaded,
            etag,
        });
    }

    // Directory order differs from key order once a segment is a prefix of
    // another, and escaped segments sort apart from their keys.
    objects.sort_by(|a, b| a.key.cmp(&b.key));
    if let Some(after) = after {
        objects.retain(|o| o.key.as_str() > after);
    }
    Ok(ObjectListing::from_sorted(objects, limit))
}
