//! HTTP client for a bucketd façade.

use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use common::{
    ErrorResponse, HEALTH_PATH, HealthResponse, LIST_PATH, ListResponse, SuccessResponse,
    UploadedObject, encode_component,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The key does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Connection failures, timeouts, 5xx and 429. Worth another attempt.
    #[error("{0}")]
    Transient(String),

    /// Anything the server refused for good, e.g. an invalid key or a body over the size limit.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Transient(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else if err.is_builder() {
            RemoteError::Rejected(format!("invalid request: {err}"))
        } else {
            RemoteError::Transient(format!("request failed: {err}"))
        }
    }
}

pub struct RemoteBucket {
    client: Client,
    base_url: String,
}

impl RemoteBucket {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/<key>`, the key encoded as a single path segment.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, encode_component(key))
    }

    pub async fn health(&self) -> Result<HealthResponse, RemoteError> {
        let url = format!("{}/{HEALTH_PATH}", self.base_url);
        send_and_json(self.client.get(url)).await
    }

    /// One page of the listing, starting after `cursor`.
    pub async fn list(&self, cursor: Option<&str>) -> Result<ListResponse, RemoteError> {
        let url = format!("{}/{LIST_PATH}", self.base_url);
        let mut builder = self.client.get(url);
        if let Some(cursor) = cursor {
            builder = builder.query(&[("cursor", cursor)]);
        }
        send_and_json(builder).await
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, RemoteError> {
        let res = send_and_check(self.client.get(self.object_url(key))).await?;
        Ok(res.bytes().await?)
    }

    pub async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<UploadedObject, RemoteError> {
        let builder = self
            .client
            .put(self.object_url(key))
            .header(CONTENT_TYPE, content_type)
            .body(body);
        let res: SuccessResponse<UploadedObject> = send_and_json(builder).await?;
        res.data
            .ok_or_else(|| RemoteError::Decode(format!("upload of `{key}` returned no object")))
    }

    /// Succeeds when the key is already gone.
    pub async fn delete(&self, key: &str) -> Result<(), RemoteError> {
        send_and_check(self.client.delete(self.object_url(key))).await?;
        Ok(())
    }
}

async fn send_and_json<U: DeserializeOwned>(builder: RequestBuilder) -> Result<U, RemoteError> {
    let res = send_and_check(builder).await?;
    let bytes = res.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| RemoteError::Decode(e.to_string()))
}

async fn send_and_check(builder: RequestBuilder) -> Result<Response, RemoteError> {
    let res = builder.send().await?;
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let url = res.url().to_string();
    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    Err(classify(status, &url, &message))
}

fn classify(status: StatusCode, url: &str, message: &str) -> RemoteError {
    let detail = if message.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {message}", status.as_u16())
    };
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound(url.to_string()),
        StatusCode::TOO_MANY_REQUESTS => RemoteError::Transient(detail),
        s if s.is_server_error() => RemoteError::Transient(detail),
        _ => RemoteError::Rejected(detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert!(classify(StatusCode::NOT_FOUND, "u", "").is_not_found());
        assert!(classify(StatusCode::SERVICE_UNAVAILABLE, "u", "").is_transient());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "u", "").is_transient());

        let rejected = classify(StatusCode::PAYLOAD_TOO_LARGE, "u", "File size exceeds maximum allowed size");
        assert!(!rejected.is_transient());
        assert_eq!(
            rejected.to_string(),
            "HTTP 413: File size exceeds maximum allowed size"
        );
        assert_eq!(
            classify(StatusCode::BAD_GATEWAY, "u", "").to_string(),
            "HTTP 502"
        );
    }

    #[test]
    fn test_object_url() {
        let remote = RemoteBucket::new("http://127.0.0.1:8787/", Duration::from_secs(1)).unwrap();
        assert_eq!(remote.base_url(), "http://127.0.0.1:8787");
        assert_eq!(
            remote.object_url("notes/Test (2024).md"),
            "http://127.0.0.1:8787/notes%2FTest%20(2024).md"
        );
    }
}
