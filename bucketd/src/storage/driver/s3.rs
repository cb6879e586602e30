//! S3-compatible driver (AWS S3, Cloudflare R2, MinIO, ...) on top of aws-sdk-s3.

use crate::storage::{ObjectInfo, ObjectListing, ObjectMetadata, ObjectStore, StoredObject};

use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime as S3DateTime};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io;

/// S3 rejects `max-keys` above this value, larger listings are paged.
const MAX_KEYS_PER_PAGE: usize = 1000;

#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    /// Custom endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`.
    pub endpoint: Option<String>,
    pub region: String,
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: None,
            region: "auto".to_string(),
        }
    }
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Credentials come from the standard AWS environment/profile chain.
    pub async fn new(settings: &S3Settings) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(settings.region.clone()));
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
        }
    }
}

fn to_io<E: std::error::Error>(err: E) -> io::Error {
    io::Error::other(DisplayErrorContext(err).to_string())
}

fn trim_etag(etag: Option<&str>) -> String {
    etag.unwrap_or_default().trim_matches('"').to_string()
}

fn to_chrono(time: Option<&S3DateTime>) -> DateTime<Utc> {
    time.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, key: &str) -> io::Result<Option<StoredObject>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match resp {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_key())
                {
                    return Ok(None);
                }
                return Err(to_io(err));
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let etag = trim_etag(output.e_tag());
        let uploaded = to_chrono(output.last_modified());
        let body = output.body.collect().await.map_err(to_io)?.into_bytes();

        Ok(Some(StoredObject {
            info: ObjectInfo {
                key: key.to_string(),
                size: body.len() as u64,
                uploaded,
                etag,
            },
            metadata: ObjectMetadata { content_type },
            body,
        }))
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: ObjectMetadata,
    ) -> io::Result<ObjectInfo> {
        let size = body.len() as u64;
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(metadata.content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(to_io)?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size,
            uploaded: Utc::now(),
            etag: trim_etag(output.e_tag()),
        })
    }

    async fn delete(&self, key: &str) -> io::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(to_io)?;
        Ok(())
    }

    async fn list(&self, limit: usize, after: Option<&str>) -> io::Result<ObjectListing> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        let mut more = true;

        while more && objects.len() <= limit {
            // One extra key tells whether the listing was cut short.
            let want = (limit + 1 - objects.len()).min(MAX_KEYS_PER_PAGE);
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(want as i32)
                .set_start_after(after.map(str::to_string))
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(to_io)?;

            objects.extend(output.contents().iter().filter_map(|o| {
                Some(ObjectInfo {
                    key: o.key()?.to_string(),
                    size: o.size().unwrap_or_default().max(0) as u64,
                    uploaded: to_chrono(o.last_modified()),
                    etag: trim_etag(o.e_tag()),
                })
            }));

            continuation = output.next_continuation_token().map(str::to_string);
            more = output.is_truncated().unwrap_or(false) && continuation.is_some();
        }

        // Keys come back in lexicographic order.
        Ok(ObjectListing::from_sorted(objects, limit))
    }
}
