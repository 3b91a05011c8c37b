#![forbid(unsafe_code)]

//! `visit-intercom` — visit notification relay binary.
//!
//! Bootstraps configuration, connects the shared hand-off store, starts
//! the Slack Socket Mode control listener, and serves the visitor HTTP
//! surface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use visit_intercom::catalog::CommandCatalog;
use visit_intercom::config::GlobalConfig;
use visit_intercom::geo::Geolocator;
use visit_intercom::http::routes::AppState;
use visit_intercom::http::server;
use visit_intercom::persistence::{db, slot_store::SlotStore};
use visit_intercom::slack::client::SlackService;
use visit_intercom::slack::listener::ControlListener;
use visit_intercom::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "visit-intercom", about = "Visit notification relay", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("visit-intercom server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;

    // Missing Slack credentials are fatal before any traffic is served.
    config.load_credentials().await?;

    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize the shared hand-off store ────────────
    let pool = Arc::new(db::connect(&config.db_path).await?);
    let store = SlotStore::new(pool);
    info!(db = %config.db_path.display(), "hand-off store connected");

    let catalog = CommandCatalog::new();

    // ── Start the Slack control listener ────────────────
    let listener = ControlListener::new(store.clone(), catalog, config.slot_ttl());
    let (slack, slack_runtime) = SlackService::start(&config, listener).map_err(|err| {
        error!(%err, "slack service start failed");
        err
    })?;
    let slack = Arc::new(slack);
    info!("slack control listener started");

    // ── Serve the visitor HTTP surface ──────────────────
    let geo = Geolocator::from_config(&config)?;
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        store,
        slack: Some(slack),
        geo,
        catalog,
    });

    let ct = CancellationToken::new();
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(state, http_ct).await {
            error!(%err, "http surface failed");
        }
    });

    info!("visit-intercom ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    slack_runtime.socket_task.abort();
    slack_runtime.queue_task.abort();
    let _ = http_handle.await;
    info!("visit-intercom shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
