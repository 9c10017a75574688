//! Historical data sources.
//!
//! The HistoricalSource trait abstracts over where a symbol's daily history
//! comes from (a remote quote API or a local per-ticker archive) so the
//! ingestor sees one shape and deployments pick one strategy at config time.

pub mod archive;
pub mod remote;

pub use archive::ArchiveSource;
pub use remote::{HttpQuoteApi, QuoteApi, RemoteSource};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// One trading day of history, normalized into the common shape both
/// strategies produce. The remote API carries opens but no volume; the
/// archive carries volume but no open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub close: Decimal,
    pub volume: Option<u64>,
}

/// Errors from a historical source.
///
/// `SymbolNotFound` and `Malformed` are per-symbol soft failures: the
/// ingestor skips the symbol and moves on. `InvalidRange` is handled inside
/// the remote strategy (corrected and retried once). Transport errors during
/// the data fetch propagate.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("symbol not known to source: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("rejected date range {start}..{end} for {ticker}")]
    InvalidRange {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("malformed payload for {ticker}: {detail}")]
    Malformed { ticker: String, detail: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("archive i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether this error means "skip the symbol and continue" rather than
    /// "abort the run".
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            SourceError::SymbolNotFound { .. } | SourceError::Malformed { .. }
        )
    }
}

/// A strategy for obtaining one symbol's complete daily history.
pub trait HistoricalSource {
    /// Human-readable name of this source, for logs.
    fn name(&self) -> &str;

    /// Fetch every available daily record for `ticker`.
    fn fetch(&self, ticker: &str) -> Result<Vec<DailyRecord>, SourceError>;
}
