use crate::commands::{BackupArgs, ConfigArgs, DeleteAllArgs, ListArgs, UploadArgs};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "bucketctl",
    version,
    about = "Batch upload, backup and cleanup for a bucketd object store"
)]
pub struct Cli {
    /// URL of the bucketd server (overrides BUCKET_URL and the config file)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Turn verbose logging on
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file or every file under a directory
    Upload(UploadArgs),
    /// Download every object into a local directory
    Backup(BackupArgs),
    /// Delete every object in the bucket
    DeleteAll(DeleteAllArgs),
    /// List the objects in the bucket
    List(ListArgs),
    /// Show the resolved settings, optionally saving them
    Config(ConfigArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::parse_from(["bucketctl", "upload", "notes", "--key", "a.md", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(args.source, PathBuf::from("notes"));
                assert_eq!(args.key.as_deref(), Some("a.md"));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::parse_from(["bucketctl", "--url", "http://h:1", "delete-all", "--force"]);
        assert_eq!(cli.url.as_deref(), Some("http://h:1"));
        assert!(matches!(cli.command, Commands::DeleteAll(DeleteAllArgs { force: true })));

        let cli = Cli::parse_from(["bucketctl", "backup"]);
        assert!(matches!(cli.command, Commands::Backup(BackupArgs { output: None })));
    }
}
