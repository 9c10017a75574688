//! histdb core — one-shot batch loader for stock reference and history data.
//!
//! Pipeline: pipe-delimited symbol list files populate the symbol catalog
//! exactly once; each catalog row then gets its daily price/volume history
//! from a configured source (local CSV archive or remote quote API), with
//! trading-session times normalized from exchange-local civil time to UTC
//! before hitting the SQLite store.
//!
//! - [`session`] — OPEN/CLOSE wall-clock times to UTC instants, DST-correct
//! - [`catalog`] — list-file discovery, parsing, idempotent catalog load
//! - [`source`] — the `HistoricalSource` trait and its two strategies
//! - [`store`] — explicit SQLite handle: schema, counts, batch inserts
//! - [`ingest`] — per-symbol idempotent ingestion and run orchestration
//! - [`config`] — TOML deployment configuration

pub mod catalog;
pub mod config;
pub mod ingest;
pub mod session;
pub mod source;
pub mod store;

pub use catalog::{load_catalog, CatalogOutcome};
pub use config::{Config, SourceConfig};
pub use ingest::{ingest_symbol, run, IngestOutcome, LoadError, LoadSummary};
pub use session::{session_instant, Session};
pub use source::{DailyRecord, HistoricalSource, SourceError};
pub use store::{PriceObservation, Store, Symbol, SymbolRecord, VolumeObservation};
