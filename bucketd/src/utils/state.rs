use std::sync::Arc;

use crate::config::{Config, StorageKind};
use crate::storage::ObjectStore;
use crate::storage::driver::{filesystem::FilesystemStore, memory::MemoryStore, s3::S3Store};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn ObjectStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> Self {
        let storage: Arc<dyn ObjectStore> = match config.storage {
            StorageKind::Filesystem => Arc::new(FilesystemStore::new(&config.root_dir)),
            StorageKind::Memory => Arc::new(MemoryStore::new()),
            StorageKind::S3 => Arc::new(S3Store::new(&config.s3).await),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: Config, storage: Arc<dyn ObjectStore>) -> Self {
        AppState {
            storage,
            config: Arc::new(config),
        }
    }
}
