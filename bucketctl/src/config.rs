use std::time::Duration;

use anyhow::Context;
use libbatch::{BatchRunner, RetryPolicy};
use serde::{Deserialize, Serialize};

pub const ENV_URL: &str = "BUCKET_URL";
pub const ENV_BUCKET_NAME: &str = "BUCKET_NAME";
pub const ENV_VERBOSE: &str = "BUCKETCTL_VERBOSE";

/// Settings shared by every command.
///
/// Resolved from the defaults, then the `bucketctl` config file, then the
/// environment, then the command line.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub bucket_name: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_secs: u64,
    pub batch_size: usize,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8787".to_string(),
            bucket_name: "default".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
            timeout_secs: 30,
            batch_size: 10,
            verbose: false,
        }
    }
}

impl ClientConfig {
    const APP_NAME: &'static str = "bucketctl";
    const CONFIG_NAME: &'static str = "bucketctl";

    pub fn load() -> anyhow::Result<Self> {
        confy::load::<Self>(Self::APP_NAME, Self::CONFIG_NAME).with_context(|| {
            format!(
                "failed to load config file `{}.{}`",
                Self::APP_NAME,
                Self::CONFIG_NAME,
            )
        })
    }

    pub fn store(&self) -> anyhow::Result<()> {
        confy::store(Self::APP_NAME, Self::CONFIG_NAME, self).with_context(|| {
            format!(
                "failed to store config file `{}.{}`",
                Self::APP_NAME,
                Self::CONFIG_NAME,
            )
        })
    }

    pub fn path() -> anyhow::Result<std::path::PathBuf> {
        confy::get_configuration_file_path(Self::APP_NAME, Self::CONFIG_NAME)
            .context("failed to locate the config file")
    }

    /// Applies `BUCKET_URL`, `BUCKET_NAME` and `BUCKETCTL_VERBOSE`.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            self.url = url;
        }
        if let Some(name) = lookup(ENV_BUCKET_NAME).filter(|v| !v.is_empty()) {
            self.bucket_name = name;
        }
        if lookup(ENV_VERBOSE).is_some_and(|v| v == "true" || v == "1") {
            self.verbose = true;
        }
        self
    }

    /// Applies the global command line flags.
    pub fn with_overrides(mut self, url: Option<&str>, verbose: bool) -> Self {
        if let Some(url) = url {
            self.url = url.to_string();
        }
        self.verbose |= verbose;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn batch_runner(&self) -> BatchRunner {
        BatchRunner::new(self.batch_size)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
