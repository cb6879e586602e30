use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use clap::Parser;
use common::{content_type_for, format_bytes, validate_key};
use libbatch::{BatchSummary, progress_bar};
use walkdir::WalkDir;

use crate::client::RemoteError;
use crate::commands::{Session, render_summary};

#[derive(Parser, Debug)]
pub struct UploadArgs {
    /// File or directory to upload
    pub source: PathBuf,

    /// Key to store a single file under
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub path: PathBuf,
    pub key: String,
}

/// A file becomes one item keyed by its file name; a directory contributes
/// every file below it, keyed by its `/`-separated relative path.
pub fn collect_files(source: &Path) -> anyhow::Result<Vec<UploadItem>> {
    let meta = std::fs::metadata(source)
        .with_context(|| format!("File or directory not found: {}", source.display()))?;

    if meta.is_file() {
        let key = source
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("`{}` has no usable file name", source.display()))?;
        return Ok(vec![UploadItem {
            path: source.to_path_buf(),
            key: key.to_string(),
        }]);
    }

    let mut items = vec![];
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(source)?;
        let Some(key) = key_for(relative) else {
            tracing::warn!("skipping non UTF-8 path {}", entry.path().display());
            continue;
        };
        items.push(UploadItem {
            path: entry.path().to_path_buf(),
            key,
        });
    }
    Ok(items)
}

fn key_for(relative: &Path) -> Option<String> {
    let segments = relative
        .components()
        .map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

pub async fn upload(session: &Session, args: UploadArgs) -> anyhow::Result<BatchSummary> {
    println!("📤 Upload to {}\n", session.remote.base_url());

    let mut items = collect_files(&args.source)?;
    if let Some(key) = args.key {
        if items.len() == 1 {
            items[0].key = key;
        } else {
            tracing::warn!("--key ignored, {} files found", items.len());
        }
    }
    println!("📊 Found {} file(s) to upload\n", items.len());

    let verbose = session.config.verbose;
    let bar = progress_bar(items.len() as u64, "Uploading");
    let bar_ref = &bar;
    let outcomes = session
        .runner
        .run_with_progress(
            items,
            |item| async move {
                let key = validate_key(&item.key)?;
                let body = Bytes::from(
                    tokio::fs::read(&item.path)
                        .await
                        .with_context(|| format!("Failed to read {}", item.path.display()))?,
                );
                let content_type = content_type_for(&key);
                let uploaded = session
                    .policy
                    .retry_when(
                        || session.remote.put(&key, body.clone(), content_type),
                        RemoteError::is_transient,
                    )
                    .await?;
                if verbose {
                    bar_ref.println(format!(
                        "✅ Uploaded: {} ({})",
                        uploaded.key,
                        format_bytes(uploaded.size)
                    ));
                }
                anyhow::Ok(uploaded)
            },
            &bar,
        )
        .await;

    let summary = BatchSummary::from_outcomes(&outcomes, |item| item.key.clone());
    print!("{}", render_summary("Upload", "uploaded", &summary));
    if summary.is_complete_success() {
        println!("\n🎉 Upload completed successfully!");
    }
    Ok(summary)
}
