use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use bucketd::api;
use bucketd::config::{Config, StorageKind};
use bucketd::storage::driver::s3::S3Settings;
use bucketd::utils::cli::Args;
use bucketd::utils::state::AppState;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = validate_config(&args).await?;
    tracing::info!(
        "bucketd {} using {:?} storage, max file size {} bytes",
        Config::version(),
        config.storage,
        config.max_file_size
    );

    let state = Arc::new(AppState::new(config).await);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", args.host, args.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", args.host, args.port))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutting down...");
}

async fn validate_config(args: &Args) -> anyhow::Result<Config> {
    let mut validation_errors = Vec::new();

    if args.storage == StorageKind::Filesystem {
        let root_dir = Path::new(&args.root);
        match tokio::fs::metadata(root_dir).await {
            Ok(meta) if !meta.is_dir() => validation_errors.push(format!(
                "BUCKETD_ROOTDIR `{}` exists but is not a directory",
                args.root,
            )),
            Ok(_) => {}
            Err(_) => {
                tokio::fs::create_dir_all(root_dir)
                    .await
                    .with_context(|| format!("failed to create BUCKETD_ROOTDIR `{}`", args.root))?;
                tracing::info!("created storage root {}", args.root);
            }
        }
    }

    if args.storage == StorageKind::S3 && args.s3_bucket.is_empty() {
        validation_errors.push("BUCKETD_S3_BUCKET is required for S3 storage".to_string());
    }
    if args.max_file_size == 0 {
        validation_errors.push("BUCKETD_MAX_FILE_SIZE must be greater than 0".to_string());
    }
    if args.max_list_results == 0 {
        validation_errors.push("BUCKETD_MAX_LIST_RESULTS must be greater than 0".to_string());
    }

    if !validation_errors.is_empty() {
        bail!("{}", validation_errors.join("\n"));
    }

    // Debug logging implies detailed error bodies.
    let debug_logging = args.log.contains("debug") || args.log.contains("trace");

    Ok(Config {
        host: args.host.clone(),
        port: args.port,
        storage: args.storage,
        root_dir: args.root.clone().into(),
        s3: S3Settings {
            bucket: args.s3_bucket.clone(),
            endpoint: args.s3_endpoint.clone(),
            region: args.s3_region.clone(),
        },
        max_file_size: args.max_file_size,
        max_list_results: args.max_list_results,
        cors_allow_origin: args.cors_origin.clone(),
        cors_max_age_secs: bucketd::config::DEFAULT_CORS_MAX_AGE_SECS,
        expose_error_details: args.error_details || debug_logging,
    })
}
