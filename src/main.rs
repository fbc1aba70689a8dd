//! Model Cache Manager - Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use model_cache_manager::{
    CacheStore, DiskSpaceReporter, api,
    commands::{self, AssumeYes, ClearTarget, Prompt},
    config::ManagerConfig,
    metrics,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "model-cache-manager")]
#[command(about = "Inspect and clean the local model cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override cache root directory
    #[arg(long, global = true)]
    cache_root: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log format (json or pretty)
    #[arg(long, default_value = "pretty", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show cache location, total size and cached models
    Info {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the whole cache, or models matching NAME
    Clear {
        /// Case-insensitive substring of the model directory name
        name: Option<String>,

        /// Match NAME exactly instead of as a substring
        #[arg(long, requires = "name")]
        exact: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show total, used and free space where the cache lives
    Diskspace {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API
    Serve {
        /// Override API port
        #[arg(long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for --json
    match cli.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(&cli.log_level)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let mut config = ManagerConfig::load(cli.config)?;

    // CLI overrides
    if let Some(root) = cli.cache_root {
        config.cache_root = Some(root);
    }
    if let Command::Serve { port } = cli.command {
        if let Some(port) = port {
            config.api_port = port;
        }
        config.validate_api()?;
    }

    config.validate()?;

    let store = CacheStore::new(config.resolved_cache_root());
    let reporter = DiskSpaceReporter::new();

    tracing::debug!(
        cache_root = ?store.root(),
        low_space_threshold_bytes = config.low_space_threshold_bytes,
        "Configuration loaded"
    );

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Info { json } => commands::info(&store, json, &mut stdout),
        Command::Clear { name, exact, yes } => {
            let target = match name {
                None => ClearTarget::All,
                Some(name) if exact => ClearTarget::Exact(name),
                Some(name) => ClearTarget::Matching(name),
            };
            if yes {
                commands::clear(&store, &reporter, &target, &mut AssumeYes, &mut stdout)
            } else {
                commands::clear(&store, &reporter, &target, &mut Prompt::stdio(), &mut stdout)
            }
        }
        Command::Diskspace { json } => commands::diskspace(
            &reporter,
            store.root(),
            config.low_space_threshold_bytes,
            json,
            &mut stdout,
        ),
        Command::Serve { .. } => {
            drop(stdout);
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to start async runtime")?
                .block_on(serve(config, store, reporter))
        }
    }
}

async fn serve(config: ManagerConfig, store: CacheStore, reporter: DiskSpaceReporter) -> Result<()> {
    tracing::info!(cache_root = ?store.root(), "Starting Model Cache Manager API");

    let prometheus_handle = metrics::setup_metrics()?;

    let app_state = api::AppState {
        store: Arc::new(store),
        reporter: Arc::new(reporter),
        low_space_threshold_bytes: config.low_space_threshold_bytes,
        prometheus_handle,
    };

    let app = api::create_router(app_state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind API server")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
