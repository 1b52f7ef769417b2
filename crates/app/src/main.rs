//! hadir - event check-in server

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use hadir::AppState;
use hadir::server::serve;
use hadir_config::AppConfig;
use hadir_ipc::{NewRosterEntry, RosterEntry};
use hadir_store::{Backend, Collection, insert_as};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Event check-in service with signature capture
#[derive(Parser, Debug)]
#[command(name = "hadir")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configured one
    #[arg(long)]
    bind: Option<String>,

    /// JSON array of participants to add to the roster at startup
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

async fn seed_roster(backend: &Backend, path: &Path) -> Result<usize> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {}", path.display()))?;
    let entries: Vec<NewRosterEntry> =
        serde_json::from_str(&json).context("Roster file is not a participant list")?;

    let mut added = 0;
    for entry in entries {
        let entry = entry.trimmed();
        if let Some(field) = entry.first_empty_field() {
            warn!("Skipping roster entry {:?}: empty {}", entry.nama, field);
            continue;
        }
        let _: RosterEntry = insert_as(backend, Collection::DaftarNama, &entry).await?;
        added += 1;
    }
    Ok(added)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = AppConfig::load(args.config.as_deref()).context("Invalid configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let backend = Backend::from_config(&config.backend).context("Failed to set up backend")?;
    if let Some(path) = &args.roster {
        let added = seed_roster(&backend, path).await?;
        info!("Seeded {} roster entries from {}", added, path.display());
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    let state = AppState::new(config, backend);
    serve(listener, state, shutdown_signal()).await?;
    Ok(())
}
