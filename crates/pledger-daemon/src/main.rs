//! pledger-daemon - Model Scoring Service
//!
//! Loads the model artifact and the prediction ledger once at startup,
//! then serves the scoring API over HTTP until SIGINT/SIGTERM. Both are
//! process-wide shared state: the artifact is read-only after load, and
//! the ledger serializes its own writes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pledger_core::ledger::SqliteLedger;
use pledger_core::predict::ModelArtifact;
use pledger_daemon::config::ServiceConfig;
use pledger_daemon::handlers;
use pledger_daemon::metrics::ServiceMetrics;
use pledger_daemon::state::AppState;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// pledger daemon - model scoring facade
#[derive(Parser, Debug)]
#[command(name = "pledger-daemon")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to service configuration file
    #[arg(short, long, default_value = "pledger.toml")]
    config: PathBuf,

    /// Bind address (overrides configuration)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Path to the SQLite prediction database (overrides configuration)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Path to the JSON model artifact (overrides configuration)
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Log level filter (e.g. info, debug, pledger_daemon=trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = if args.config.exists() {
        ServiceConfig::from_file(&args.config)
            .with_context(|| format!("failed to load {}", args.config.display()))?
    } else {
        info!(config = %args.config.display(), "configuration file not found, using defaults");
        ServiceConfig::default()
    };

    let bind_addr = args.bind.unwrap_or(config.server.bind_addr);
    // Precedence: CLI flag, then DATABASE_PATH, then the config file.
    let db_path = args
        .db
        .or_else(|| std::env::var_os("DATABASE_PATH").map(PathBuf::from))
        .unwrap_or(config.storage.db_path);
    let artifact_path = args.artifact.unwrap_or(config.model.artifact_path);

    let artifact = ModelArtifact::from_file(&artifact_path)
        .with_context(|| format!("failed to load model artifact {}", artifact_path.display()))?;
    info!(artifact = %artifact_path.display(), "loaded model artifact");

    let ledger = SqliteLedger::open(&db_path)
        .with_context(|| format!("failed to open prediction ledger {}", db_path.display()))?;
    info!(db = %db_path.display(), "opened prediction ledger");

    let metrics = ServiceMetrics::new().context("failed to build metrics registry")?;

    let state = Arc::new(AppState {
        classifier: Arc::new(artifact),
        ledger,
        metrics,
    });
    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "scoring service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    tokio::select! {
        () = ctrl_c => info!("received SIGINT, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
