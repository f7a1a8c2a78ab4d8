//! sdir-ds (Directory Service) - member directory over a shared spreadsheet
//!
//! Serves member search and new-member submission as a JSON API for the
//! directory front-end.

use anyhow::{Context, Result};
use clap::Parser;
use sdir_common::config::{
    load_toml_config, resolve_config_path, resolve_setting, SheetsSettings, TomlConfig,
    DEFAULT_BIND, ENV_BIND,
};
use sdir_common::events::EventBus;
use sdir_ds::api::buildinfo::BuildInfo;
use sdir_ds::engine::{sample_rows, spawn_member_added_listener};
use sdir_ds::store::{self, DirectoryStore, MemoryStore};
use sdir_ds::{build_router, AppState, EVENT_BUS_CAPACITY};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sdir-ds")]
#[command(about = "Member directory service")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/sdir/sdir-ds.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:5731
    #[arg(short, long)]
    bind: Option<String>,

    /// Record list source: api or csv
    #[arg(long)]
    list_source: Option<String>,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Serve the built-in sample members from memory instead of the spreadsheet
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    init_tracing(args.log_level.as_deref(), &toml_config.logging.level);

    // Build identification first, before any network delay
    let build = BuildInfo::CURRENT;
    info!(
        "Starting Directory Service ({}) v{} [{}] built {} ({})",
        build.module, build.version, build.git_hash, build.build_timestamp, build.build_profile
    );
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => warn!("No config directory available; using environment and defaults"),
    }

    let store: Arc<dyn DirectoryStore> = if args.demo {
        info!("Demo mode: serving sample members from memory");
        Arc::new(MemoryStore::new(sample_rows()))
    } else {
        let settings = SheetsSettings::resolve(&toml_config, args.list_source.as_deref())?;
        store::from_settings(&settings).context("Failed to configure directory store")?
    };

    let event_bus = EventBus::new(EVENT_BUS_CAPACITY);
    let state = AppState::new(store, event_bus.clone());

    let report = state.engine.load().await;
    info!(count = report.count, source = ?report.source, "Initial member list ready");

    let _listener = spawn_member_added_listener(Arc::clone(&state.engine), &event_bus);

    let bind = resolve_setting("bind", args.bind.as_deref(), ENV_BIND, toml_config.bind.as_deref())
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;
    info!("sdir-ds listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Log filter: `--log-level` → `RUST_LOG` → TOML `logging.level`
fn init_tracing(cli_level: Option<&str>, toml_level: &str) {
    let filter = cli_level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .or_else(|| EnvFilter::try_new(toml_level).ok())
        .unwrap_or_else(|| EnvFilter::new(sdir_common::config::DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
