//! histdb — zero-argument batch loader.
//!
//! Reads `histdb.toml` from the working directory (defaults apply when the
//! file is absent), loads the symbol catalog and every symbol's history, and
//! prints a one-line summary. The run either completes or fails; there are
//! no flags and no partial-repair modes.

use anyhow::{Context, Result};
use histdb_core::{Config, Store};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "histdb.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::load(Path::new(CONFIG_PATH)).context("loading configuration")?;
    tracing::debug!(?config, "configuration resolved");

    let mut store = Store::open(&config.db_path)
        .with_context(|| format!("opening store at {}", config.db_path.display()))?;
    let source = config.build_source().context("building historical source")?;

    let summary = histdb_core::run(&mut store, source.as_ref(), &config.data_dir)
        .context("batch load failed")?;

    println!(
        "{} symbols: {} loaded, {} already present, {} skipped",
        summary.total(),
        summary.loaded,
        summary.already_loaded,
        summary.skipped.len()
    );
    Ok(())
}
