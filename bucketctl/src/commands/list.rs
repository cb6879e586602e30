use std::collections::HashMap;

use clap::Parser;
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use common::{FileEntry, format_bytes};

use crate::commands::Session;

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print the file list as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn list(session: &Session, args: ListArgs) -> anyhow::Result<()> {
    let listing = session.fetch_listing().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listing.files)?);
        return Ok(());
    }

    println!("📊 Total files: {}", listing.count);
    if listing.files.is_empty() {
        println!("✅ No files in bucket.");
        return Ok(());
    }
    println!("💾 Total size: {}\n", format_bytes(listing.total_size()));

    println!("📁 Files by extension:");
    for (ext, count) in count_by_extension(&listing.files) {
        println!("  .{ext}: {count} files");
    }
    println!();

    println!("{}", file_table(&listing.files, session.config.verbose));
    Ok(())
}

pub fn file_table(files: &[FileEntry], verbose: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let mut header = vec!["#", "key", "size", "uploaded"];
    if verbose {
        header.push("etag");
    }
    table.set_header(header);

    files.iter().enumerate().for_each(|(i, file)| {
        let mut row = vec![
            (i + 1).to_string(),
            file.key.clone(),
            format_bytes(file.size),
            file.uploaded.format("%Y-%m-%d %H:%M:%S").to_string(),
        ];
        if verbose {
            row.push(file.etag.clone());
        }
        table.add_row(row);
    });
    table
}

/// File counts per lowercased extension, most common first.
pub fn count_by_extension(files: &[FileEntry]) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for file in files {
        let name = file.key.rsplit('/').next().unwrap_or(&file.key);
        let ext = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => "no-extension".to_string(),
        };
        *counts.entry(ext).or_default() += 1;
    }

    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> FileEntry {
        FileEntry {
            key: key.into(),
            size: 1,
            uploaded: Default::default(),
            etag: String::new(),
        }
    }

    #[test]
    fn test_count_by_extension() {
        let files: Vec<_> = ["a.md", "notes/b.MD", "c.png", "Makefile", ".env", "d.txt", "e.txt"]
            .into_iter()
            .map(entry)
            .collect();
        assert_eq!(
            count_by_extension(&files),
            vec![
                ("md".to_string(), 2),
                ("no-extension".to_string(), 2),
                ("txt".to_string(), 2),
                ("png".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_file_table() {
        let table = file_table(&[entry("notes/a.md")], false).to_string();
        assert!(table.contains("notes/a.md"));
        assert!(table.contains("1 B"));
        assert!(!table.contains("etag"));
        assert!(file_table(&[entry("notes/a.md")], true).to_string().contains("etag"));
    }
}
