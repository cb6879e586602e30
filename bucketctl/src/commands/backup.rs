use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use common::{FileEntry, format_bytes, validate_key};
use libbatch::{BatchSummary, progress_bar};
use serde::{Deserialize, Serialize};

use crate::client::RemoteError;
use crate::commands::{Session, render_summary};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Parser, Debug)]
pub struct BackupArgs {
    /// Output directory for the backup [default: ./backup]
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Written to `<output>/manifest.json` after every backup run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub total_files: usize,
    pub total_size: u64,
    pub successful: usize,
    pub failed: usize,
    pub files: Vec<ManifestFile>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    pub key: String,
    pub size: u64,
    pub uploaded: DateTime<Utc>,
}

impl From<&FileEntry> for ManifestFile {
    fn from(entry: &FileEntry) -> Self {
        Self {
            key: entry.key.clone(),
            size: entry.size,
            uploaded: entry.uploaded,
        }
    }
}

pub async fn backup(session: &Session, args: BackupArgs) -> anyhow::Result<BatchSummary> {
    let output = args.output.unwrap_or_else(|| PathBuf::from("backup"));
    println!("💾 Backup of {}", session.remote.base_url());
    println!("Output directory: {}\n", output.display());

    tokio::fs::create_dir_all(&output)
        .await
        .with_context(|| format!("Failed to create backup directory {}", output.display()))?;

    println!("📋 Fetching file list...");
    let listing = session.fetch_listing().await?;
    println!("📊 Found {} files", listing.count);
    if listing.files.is_empty() {
        println!("✅ No files to backup.");
        return Ok(BatchSummary::default());
    }
    let total_size = listing.total_size();
    println!("💾 Total size: {}\n", format_bytes(total_size));

    let verbose = session.config.verbose;
    let bar = progress_bar(listing.files.len() as u64, "Backing up");
    let bar_ref = &bar;
    let output_ref = output.as_path();
    let outcomes = session
        .runner
        .run_with_progress(
            listing.files.clone(),
            |file| async move {
                let written = download(session, &file.key, output_ref).await?;
                if verbose {
                    bar_ref.println(format!(
                        "✅ Downloaded: {} ({})",
                        file.key,
                        format_bytes(written)
                    ));
                }
                anyhow::Ok(written)
            },
            &bar,
        )
        .await;

    let summary = BatchSummary::from_outcomes(&outcomes, |file| file.key.clone());
    let manifest = Manifest {
        timestamp: Utc::now(),
        source: session.remote.base_url().to_string(),
        total_files: listing.files.len(),
        total_size,
        successful: summary.succeeded,
        failed: summary.failed,
        files: listing.files.iter().map(ManifestFile::from).collect(),
    };
    let manifest_path = output.join(MANIFEST_FILE);
    tokio::fs::write(&manifest_path, serde_json::to_vec_pretty(&manifest)?)
        .await
        .with_context(|| format!("Failed to write {}", manifest_path.display()))?;

    print!("{}", render_summary("Backup", "backed up", &summary));
    println!("  📁 Location: {}", output.display());
    if summary.is_complete_success() {
        println!("\n🎉 Backup completed successfully!");
    }
    Ok(summary)
}

/// Fetches one object into `output`, creating parent directories.
async fn download(session: &Session, key: &str, output: &Path) -> anyhow::Result<u64> {
    // Keys become local paths, so they get the same checks the server applies.
    let key = validate_key(key)?;
    let body = session
        .policy
        .retry_when(|| session.remote.get(&key), RemoteError::is_transient)
        .await?;

    let path = output.join(&key);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(body.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_manifest_shape() {
        let uploaded = "2024-05-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let manifest = Manifest {
            timestamp: uploaded,
            source: "http://127.0.0.1:8787".into(),
            total_files: 1,
            total_size: 12,
            successful: 1,
            failed: 0,
            files: vec![ManifestFile {
                key: "notes/a.md".into(),
                size: 12,
                uploaded,
            }],
        };

        assert_eq!(
            serde_json::to_value(&manifest).unwrap(),
            json!({
                "timestamp": "2024-05-01T10:00:00Z",
                "source": "http://127.0.0.1:8787",
                "totalFiles": 1,
                "totalSize": 12,
                "successful": 1,
                "failed": 0,
                "files": [{"key": "notes/a.md", "size": 12, "uploaded": "2024-05-01T10:00:00Z"}],
            })
        );
    }
}
