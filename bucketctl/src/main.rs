use bucketctl::args::Cli;
use bucketctl::commands::{self, Session};
use bucketctl::config::ClientConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match try_main(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("\n❌ Error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn try_main(cli: Cli) -> anyhow::Result<i32> {
    let config = ClientConfig::load()?
        .with_env(|key| std::env::var(key).ok())
        .with_overrides(cli.url.as_deref(), cli.verbose);

    let default_level = if config.verbose {
        "warn,bucketctl=debug,libbatch=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(?config, "resolved configuration");

    let session = Session::new(config)?;
    let mut input = std::io::stdin().lock();
    commands::run(cli.command, &session, &mut input).await
}
