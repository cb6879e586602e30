pub mod backup;
pub mod config;
pub mod delete_all;
pub mod list;
pub mod upload;

pub use backup::{BackupArgs, backup};
pub use config::{ConfigArgs, config};
pub use delete_all::{DeleteAllArgs, delete_all};
pub use list::{ListArgs, list};
pub use upload::{UploadArgs, upload};

use std::fmt::Write;
use std::io::BufRead;

use anyhow::{Context, bail};
use common::ListResponse;
use libbatch::{BatchRunner, BatchSummary, RetryPolicy};

use crate::args::Commands;
use crate::client::{RemoteBucket, RemoteError};
use crate::config::ClientConfig;

/// Error lines printed under a summary; the rest are only counted.
pub const MAX_ERRORS_SHOWN: usize = 10;

/// Everything a command needs to talk to the bucket.
pub struct Session {
    pub config: ClientConfig,
    pub remote: RemoteBucket,
    pub policy: RetryPolicy,
    pub runner: BatchRunner,
}

impl Session {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let remote = RemoteBucket::new(&config.url, config.timeout())?;
        Ok(Self {
            policy: config.retry_policy(),
            runner: config.batch_runner(),
            remote,
            config,
        })
    }

    /// Fetches the whole object listing page by page, retrying transient
    /// failures of each page. A page that cannot be fetched is fatal to the
    /// command.
    pub async fn fetch_listing(&self) -> anyhow::Result<ListResponse> {
        let mut files = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .policy
                .retry_when(|| self.remote.list(cursor.as_deref()), RemoteError::is_transient)
                .await
                .with_context(|| {
                    format!("Failed to fetch the file list from {}", self.remote.base_url())
                })?;
            files.extend(page.files);
            if !page.truncated {
                break;
            }

            let next = page.cursor.context("Truncated file list carries no cursor")?;
            if cursor.as_deref().is_some_and(|prev| next.as_str() <= prev) {
                bail!("File list cursor `{next}` does not advance");
            }
            tracing::debug!("listed {} files so far, continuing after {next}", files.len());
            cursor = Some(next);
        }
        Ok(ListResponse::new(files, false, None))
    }
}

/// Runs `command` and returns the process exit code.
pub async fn run(command: Commands, session: &Session, input: &mut dyn BufRead) -> anyhow::Result<i32> {
    let code = match command {
        Commands::Upload(args) => upload(session, args).await?.exit_code(),
        Commands::Backup(args) => backup(session, args).await?.exit_code(),
        Commands::DeleteAll(args) => delete_all(session, args, input).await?.exit_code(),
        Commands::List(args) => {
            list(session, args).await?;
            0
        }
        Commands::Config(args) => {
            config(&session.config, args)?;
            0
        }
    };
    Ok(code)
}

/// Counts plus at most [`MAX_ERRORS_SHOWN`] error lines.
pub fn render_summary(title: &str, verb: &str, summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n📊 {title} Summary:");
    let _ = writeln!(out, "  ✅ Successfully {verb}: {} files", summary.succeeded);
    let _ = writeln!(out, "  ❌ Failed: {} files", summary.failed);

    if !summary.errors.is_empty() {
        let _ = writeln!(out, "\n❌ Errors encountered:");
        for error in summary.errors.iter().take(MAX_ERRORS_SHOWN) {
            let _ = writeln!(out, "  - {error}");
        }
        if summary.errors.len() > MAX_ERRORS_SHOWN {
            let _ = writeln!(
                out,
                "  ... and {} more errors",
                summary.errors.len() - MAX_ERRORS_SHOWN
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_summary_caps_errors() {
        let summary = BatchSummary {
            succeeded: 3,
            failed: 12,
            errors: (0..12).map(|i| format!("file{i}.md: HTTP 500")).collect(),
        };
        let out = render_summary("Backup", "backed up", &summary);
        assert!(out.contains("Successfully backed up: 3 files"));
        assert!(out.contains("Failed: 12 files"));
        assert!(out.contains("file9.md: HTTP 500"));
        assert!(!out.contains("file10.md"));
        assert!(out.contains("... and 2 more errors"));
    }

    #[test]
    fn test_render_summary_without_errors() {
        let summary = BatchSummary {
            succeeded: 2,
            ..BatchSummary::default()
        };
        let out = render_summary("Upload", "uploaded", &summary);
        assert!(!out.contains("Errors"));
    }
}
