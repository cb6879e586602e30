use std::io::BufRead;

use anyhow::Context;
use clap::Parser;
use common::format_bytes;
use libbatch::{BatchSummary, progress_bar};

use crate::client::RemoteError;
use crate::commands::{Session, render_summary};

/// Word the user has to type to confirm.
pub const CONFIRMATION: &str = "DELETE";
const SAMPLE_SIZE: usize = 10;

#[derive(Parser, Debug)]
pub struct DeleteAllArgs {
    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Reads one line and compares it, trimmed, to [`CONFIRMATION`].
pub fn confirmed(input: &mut dyn BufRead) -> anyhow::Result<bool> {
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(answer.trim() == CONFIRMATION)
}

pub async fn delete_all(
    session: &Session,
    args: DeleteAllArgs,
    input: &mut dyn BufRead,
) -> anyhow::Result<BatchSummary> {
    println!("🔍 Bucket cleanup");
    println!("Server: {}", session.remote.base_url());
    println!("Bucket: {}\n", session.config.bucket_name);

    println!("📋 Fetching file list...");
    let listing = session.fetch_listing().await?;
    println!("📊 Found {} files\n", listing.count);
    if listing.files.is_empty() {
        println!("✅ No files to delete. Bucket is already empty.");
        return Ok(BatchSummary::default());
    }
    println!("💾 Total size: {}\n", format_bytes(listing.total_size()));

    println!("Sample files:");
    for (i, file) in listing.files.iter().take(SAMPLE_SIZE).enumerate() {
        println!("  {}. {} ({})", i + 1, file.key, format_bytes(file.size));
    }
    if listing.files.len() > SAMPLE_SIZE {
        println!("  ... and {} more files", listing.files.len() - SAMPLE_SIZE);
    }

    if !args.force {
        println!("\n⚠️  WARNING: This will DELETE ALL FILES from the bucket!");
        println!("This action cannot be undone.\n");
        println!("Type \"{CONFIRMATION}\" to confirm: ");
        if !confirmed(input)? {
            println!("\n❌ Aborted. No files were deleted.");
            return Ok(BatchSummary::default());
        }
    }

    println!("\n🗑️  Deleting files...\n");
    let keys: Vec<String> = listing.files.into_iter().map(|f| f.key).collect();
    let total = keys.len();
    let verbose = session.config.verbose;
    let bar = progress_bar(total as u64, "Deleting");
    let bar_ref = &bar;
    let outcomes = session
        .runner
        .run_with_progress(
            keys,
            |key| async move {
                let res = session
                    .policy
                    .retry_when(|| session.remote.delete(&key), RemoteError::is_transient)
                    .await;
                match res {
                    Ok(()) => {}
                    Err(err) if err.is_not_found() => {
                        tracing::debug!("{key} already gone");
                    }
                    Err(err) => return Err(err),
                }
                if verbose {
                    bar_ref.println(format!("✅ Deleted: {key}"));
                }
                Ok(())
            },
            &bar,
        )
        .await;

    let summary = BatchSummary::from_outcomes(&outcomes, |key| key.clone());
    print!("{}", render_summary("Deletion", "deleted", &summary));
    println!("  📁 Total processed: {total} files");
    if summary.is_complete_success() {
        println!("\n🎉 All files deleted successfully!");
    }
    Ok(summary)
}
