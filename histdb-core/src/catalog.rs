//! Symbol catalog loading from pipe-delimited list files.
//!
//! List files live in a data directory and are discovered by name: anything
//! containing `list` with a `.txt` extension. Each line is `TICKER|Name|...`;
//! fields past the second are ignored. Duplicate tickers across files resolve
//! last-write-wins in discovery order.
//!
//! The load is idempotent at whole-run granularity: a non-empty catalog is
//! left untouched, so list files added after the first run are not picked up.
//! That matches the loader's one-shot contract and is intentional.

use crate::store::{Store, StoreError, SymbolRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot read list file {path}: {source}")]
    ListFile { path: PathBuf, source: csv::Error },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a catalog load did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOutcome {
    /// Inserted this many catalog rows.
    Loaded(usize),
    /// The catalog already had rows; nothing was read or inserted.
    AlreadyLoaded,
}

/// Finds list files under `data_dir`: names containing `list` and ending in
/// `.txt`, sorted so discovery order is stable across runs.
pub fn discover_list_files(data_dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let entries = std::fs::read_dir(data_dir).map_err(|source| CatalogError::DataDir {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::DataDir {
            path: data_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.contains("list") && name.ends_with(".txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Parses one pipe-delimited list file into (ticker, name) records.
///
/// An unreadable file is fatal for the whole run; there is no partial-file
/// skip. Blank lines and lines without a ticker field are ignored.
pub fn parse_list_file(path: &Path) -> Result<Vec<SymbolRecord>, CatalogError> {
    let map_err = |source: csv::Error| CatalogError::ListFile {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(map_err)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(map_err)?;
        let Some(ticker) = row.get(0).map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let name = row
            .get(1)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from);
        records.push(SymbolRecord {
            ticker: ticker.to_string(),
            name,
        });
    }
    Ok(records)
}

/// Loads the symbol catalog from every list file under `data_dir`.
///
/// No-op when the catalog already holds rows. Otherwise parses all files,
/// dedups tickers last-write-wins, and inserts the result as one batch.
pub fn load_catalog(store: &mut Store, data_dir: &Path) -> Result<CatalogOutcome, CatalogError> {
    if store.symbol_count()? > 0 {
        tracing::debug!("symbol catalog already populated, skipping list files");
        return Ok(CatalogOutcome::AlreadyLoaded);
    }

    let mut by_ticker: BTreeMap<String, SymbolRecord> = BTreeMap::new();
    for path in discover_list_files(data_dir)? {
        let records = parse_list_file(&path)?;
        tracing::debug!(path = %path.display(), count = records.len(), "parsed list file");
        for record in records {
            by_ticker.insert(record.ticker.clone(), record);
        }
    }

    let records: Vec<SymbolRecord> = by_ticker.into_values().collect();
    store.insert_symbols(&records)?;
    tracing::info!(count = records.len(), "loaded symbol catalog");
    Ok(CatalogOutcome::Loaded(records.len()))
}
