//! Per-symbol ingestion and batch-load orchestration.
//!
//! The run is strictly sequential: load the catalog once, then ingest each
//! catalog row in order. A symbol is one unit of work — its observations are
//! inserted in a single transaction, and no transaction spans two symbols.
//! Source-side soft failures (unknown symbol, missing archive, malformed
//! payload) skip that symbol; store failures abort the run.

use crate::catalog::{load_catalog, CatalogError};
use crate::session::{session_instant, Session, SessionTimeError};
use crate::source::{HistoricalSource, SourceError};
use crate::store::{PriceObservation, Store, StoreError, Symbol, VolumeObservation};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionTimeError),

    #[error("source failure for {ticker}: {source}")]
    Source {
        ticker: String,
        source: SourceError,
    },
}

/// What ingesting one symbol did.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Fetched history and inserted this many rows per table.
    Loaded { prices: usize, volumes: usize },
    /// The symbol already had rows; nothing was fetched or inserted.
    AlreadyLoaded,
    /// Soft per-symbol failure; the run continues with the next symbol.
    Skipped(SourceError),
}

/// Ingest one symbol's history, idempotently.
///
/// The guard is per-symbol: any existing price or volume row means the
/// symbol is treated as done and nothing is fetched. Finer-grained repair is
/// out of scope; the per-symbol transaction in the store keeps a crashed run
/// from ever leaving a partial set behind.
pub fn ingest_symbol(
    store: &mut Store,
    source: &dyn HistoricalSource,
    symbol: &Symbol,
) -> Result<IngestOutcome, LoadError> {
    if store.price_count(symbol.id)? > 0 || store.volume_count(symbol.id)? > 0 {
        return Ok(IngestOutcome::AlreadyLoaded);
    }

    let records = match source.fetch(&symbol.ticker) {
        Ok(records) => records,
        Err(e) if e.is_soft() => return Ok(IngestOutcome::Skipped(e)),
        Err(source) => {
            return Err(LoadError::Source {
                ticker: symbol.ticker.clone(),
                source,
            })
        }
    };

    let mut prices = Vec::with_capacity(records.len() * 2);
    let mut volumes = Vec::new();
    for record in &records {
        if let Some(open) = record.open {
            prices.push(PriceObservation {
                time: session_instant(record.date, Session::Open)?,
                price: open,
            });
        }
        let close_time = session_instant(record.date, Session::Close)?;
        prices.push(PriceObservation {
            time: close_time,
            price: record.close,
        });
        if let Some(volume) = record.volume {
            volumes.push(VolumeObservation {
                time: close_time,
                volume,
            });
        }
    }

    store.insert_observations(symbol.id, &prices, &volumes)?;
    Ok(IngestOutcome::Loaded {
        prices: prices.len(),
        volumes: volumes.len(),
    })
}

/// Summary of one batch load.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: usize,
    pub already_loaded: usize,
    pub skipped: Vec<(String, SourceError)>,
}

impl LoadSummary {
    pub fn total(&self) -> usize {
        self.loaded + self.already_loaded + self.skipped.len()
    }
}

/// The whole batch load: schema setup, catalog load, then one ingest per
/// catalog row in catalog order.
pub fn run(
    store: &mut Store,
    source: &dyn HistoricalSource,
    data_dir: &Path,
) -> Result<LoadSummary, LoadError> {
    store.create_schema()?;
    load_catalog(store, data_dir)?;

    let symbols = store.all_symbols()?;
    let mut summary = LoadSummary::default();

    for symbol in &symbols {
        match ingest_symbol(store, source, symbol)? {
            IngestOutcome::Loaded { prices, volumes } => {
                tracing::info!(
                    ticker = %symbol.ticker,
                    prices,
                    volumes,
                    source = source.name(),
                    "loaded history"
                );
                summary.loaded += 1;
            }
            IngestOutcome::AlreadyLoaded => {
                tracing::debug!(ticker = %symbol.ticker, "history already present");
                summary.already_loaded += 1;
            }
            IngestOutcome::Skipped(reason) => {
                tracing::warn!(ticker = %symbol.ticker, %reason, "skipping symbol");
                summary.skipped.push((symbol.ticker.clone(), reason));
            }
        }
    }

    tracing::info!(
        total = summary.total(),
        loaded = summary.loaded,
        already = summary.already_loaded,
        skipped = summary.skipped.len(),
        "batch load complete"
    );
    Ok(summary)
}
