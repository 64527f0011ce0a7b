//! fundlens server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the report API over HTTP.
//!
//! # Seeding
//!
//! To load a JSON file of tags, records, and profiles into the store and
//! exit:
//!
//! ```
//! cargo run -p fundlens-server --bin fundlens -- --seed data/seed.json
//! ```

mod seed;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use fundlens_engine::{MemoryCache, ReportEngine, cache::DEFAULT_TTL};
use fundlens_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:            String,
  port:            u16,
  store_path:      PathBuf,
  /// Report cache time-to-live; defaults to 12 hours when absent.
  cache_ttl_hours: Option<u64>,
}

#[derive(Parser)]
#[command(author, version, about = "Fundlens report server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import a JSON seed file into the store and exit.
  #[arg(long)]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FUNDLENS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: import seed data and exit.
  if let Some(seed_path) = cli.seed {
    let summary = seed::import(&store, &seed_path).await?;
    tracing::info!(
      tags = summary.tags,
      records = summary.records,
      profiles = summary.profiles,
      "seed import complete"
    );
    return Ok(());
  }

  let ttl = server_cfg
    .cache_ttl_hours
    .map(|h| Duration::from_secs(h * 60 * 60))
    .unwrap_or(DEFAULT_TTL);

  let engine = Arc::new(ReportEngine::with_cache(
    Arc::new(store),
    Arc::new(MemoryCache::new()),
    ttl,
  ));

  let app = axum::Router::new()
    .nest("/api", fundlens_api::api_router(engine))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
