use std::path::PathBuf;

use crate::storage::driver::s3::S3Settings;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_LIST_RESULTS: usize = 10_000;
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86_400;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Filesystem,
    Memory,
    S3,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub root_dir: PathBuf,
    pub s3: S3Settings,
    /// Upper bound on a single PUT body, in bytes.
    pub max_file_size: u64,
    pub max_list_results: usize,
    pub cors_allow_origin: String,
    pub cors_max_age_secs: u64,
    /// Attach the underlying cause to error bodies.
    pub expose_error_details: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            storage: StorageKind::Memory,
            root_dir: PathBuf::from("/var/lib/bucketd"),
            s3: S3Settings::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_list_results: DEFAULT_MAX_LIST_RESULTS,
            cors_allow_origin: "*".to_string(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            expose_error_details: false,
        }
    }
}

impl Config {
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
