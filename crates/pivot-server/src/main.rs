//! pivotd — the Pivot enrichment service daemon
//!
//! Loads the config file, assembles the registry/cache/orchestrator, and
//! serves the HTTP API. Configuration problems and duplicate source
//! registrations are fatal before the listener opens; everything after that
//! degrades per-operation.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pivot_cache::MemoryCache;
use pivot_core::Config;
use pivot_crypto::SecretCodec;
use pivot_engine::{MemoryLinkGroupStore, MemorySettingsStore, Orchestrator, Registry};
use pivot_server::builtin::OverviewSource;
use pivot_server::{router, AppState, HeaderAuth};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pivotd")]
#[command(about = "Indicator enrichment orchestration service", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short = 'c', long, default_value = "/etc/pivot/pivot.toml")]
    config: PathBuf,

    /// Increase debug level; repeat for more
    #[arg(long, action = clap::ArgAction::Count)]
    debug: u8,
}

fn init_tracing(debug: u8) {
    let default = match debug {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let config = Arc::new(config);

    if config.cache.backend != "memory" {
        bail!(
            "unsupported cache backend {:?}; only \"memory\" ships in-process",
            config.cache.backend
        );
    }
    let cache = Arc::new(MemoryCache::new(
        config.cache.max_entries,
        config.cache.default_ttl(),
    ));

    let mut registry = Registry::new();
    registry.register(Arc::new(OverviewSource::new()))?;
    let registry = Arc::new(registry);
    info!(sources = registry.descriptors().len(), "registry built");

    let codec = Arc::new(SecretCodec::new(&config.pivot.password_secret));
    let orchestrator = Arc::new(Orchestrator::new(
        registry.clone(),
        cache,
        codec.clone(),
        config.pivot.max_concurrency,
    ));

    let state = AppState {
        registry,
        orchestrator,
        link_groups: Arc::new(MemoryLinkGroupStore::new()),
        settings: Arc::new(MemorySettingsStore::new()),
        codec,
        auth: Arc::new(HeaderAuth::new(config.pivot.user_name_header.clone())),
        config: config.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.pivot.port));
    let listener = TcpListener::bind(addr).await.with_context(|| {
        format!(
            "could not listen on port {}; is pivotd already running?",
            config.pivot.port
        )
    })?;
    info!(%addr, "pivotd listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
