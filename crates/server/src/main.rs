//! Refresh harness for the recommendation engine.
//!
//! Loads the engine on top of the export directory, refreshes once at
//! startup, logs a sample request, then keeps refreshing on the configured
//! interval until Ctrl-C.
//!
//! Usage: `server [--data-dir DIR] [--config CONFIG_JSON]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use data_loader::DirectoryStore;
use server::{EngineConfig, RecommendationEngine};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Periodic refresh harness for the ReelRecs engine", long_about = None)]
struct Args {
    /// Path to the watchlist export directory
    #[arg(short, long, default_value = "data/cinetrack")]
    data_dir: PathBuf,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    info!("Starting ReelRecs refresh harness on {:?}", args.data_dir);
    let interval = config.refresh_interval();
    let store = Arc::new(DirectoryStore::new(args.data_dir));
    let engine = Arc::new(RecommendationEngine::new(store, config)?);

    // The first refresh has to succeed, there is nothing to fall back to
    refresh(&engine).await.context("Initial refresh failed")?;

    let user_id = 1;
    let result = engine.recommend(user_id, engine.config().default_count)?;
    info!(
        "Sample for user {}: {:?} ({})",
        user_id,
        result.recommendations,
        result.kind.as_str()
    );

    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = refresh(&engine).await {
                    error!("Scheduled refresh failed: {:#}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Run a refresh on the blocking pool; factorization is CPU-bound
async fn refresh(engine: &Arc<RecommendationEngine>) -> Result<()> {
    let engine = Arc::clone(engine);
    tokio::task::spawn_blocking(move || engine.refresh())
        .await
        .context("Refresh task panicked")??;
    Ok(())
}
