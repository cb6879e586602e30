use clap::Parser;

use crate::config::StorageKind;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Listening host
    #[arg(long, env = "BUCKETD_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listening port
    #[arg(short, long, env = "BUCKETD_PORT", default_value_t = 8787)]
    pub port: u16,

    /// Object store backend
    #[arg(
        short,
        long,
        env = "BUCKETD_STORAGE",
        value_enum,
        ignore_case = true,
        default_value = "filesystem"
    )]
    pub storage: StorageKind,

    /// Root directory of the filesystem backend
    #[arg(long, env = "BUCKETD_ROOTDIR", default_value = "/var/lib/bucketd")]
    pub root: String,

    /// Bucket name for the S3 backend
    #[arg(long, env = "BUCKETD_S3_BUCKET", default_value = "")]
    pub s3_bucket: String,

    /// Endpoint of an S3-compatible service (R2, MinIO, ...)
    #[arg(long, env = "BUCKETD_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// Region for the S3 backend
    #[arg(long, env = "BUCKETD_S3_REGION", default_value = "auto")]
    pub s3_region: String,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "BUCKETD_MAX_FILE_SIZE", default_value_t = crate::config::DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Maximum number of keys returned by `/_list`
    #[arg(long, env = "BUCKETD_MAX_LIST_RESULTS", default_value_t = crate::config::DEFAULT_MAX_LIST_RESULTS)]
    pub max_list_results: usize,

    /// Value of `Access-Control-Allow-Origin`
    #[arg(long, env = "BUCKETD_CORS_ORIGIN", default_value = "*")]
    pub cors_origin: String,

    /// Log filter, e.g. `info` or `bucketd=debug`
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log: String,

    /// Include the underlying cause in error responses
    #[arg(long, env = "BUCKETD_ERROR_DETAILS")]
    pub error_details: bool,
}
