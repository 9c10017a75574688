//! Archive-file source: pre-downloaded per-ticker history on local disk.
//!
//! Each ticker has a file `<dir>/<TICKER>.csv`. Leading lines starting with
//! `#` are comments. Data lines are `date,close_price,volume` with the date
//! in `YYYY-MM-DD` form. A missing file means the symbol has no archive and
//! is skipped, not that the run failed.

use super::{DailyRecord, HistoricalSource, SourceError};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

pub struct ArchiveSource {
    dir: PathBuf,
}

impl ArchiveSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{ticker}.csv"))
    }

    fn parse(&self, ticker: &str, path: &Path) -> Result<Vec<DailyRecord>, SourceError> {
        let malformed = |detail: String| SourceError::Malformed {
            ticker: ticker.to_string(),
            detail,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| malformed(e.to_string()))?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| malformed(e.to_string()))?;
            if row.len() < 3 {
                return Err(malformed(format!("expected 3 fields, got {}", row.len())));
            }

            let date = NaiveDate::parse_from_str(&row[0], "%Y-%m-%d")
                .map_err(|e| malformed(format!("bad date '{}': {e}", &row[0])))?;
            let close = row[1]
                .parse::<Decimal>()
                .map_err(|e| malformed(format!("bad price '{}': {e}", &row[1])))?;
            let volume = row[2]
                .parse::<u64>()
                .map_err(|e| malformed(format!("bad volume '{}': {e}", &row[2])))?;

            records.push(DailyRecord {
                date,
                open: None,
                close,
                volume: Some(volume),
            });
        }
        Ok(records)
    }
}

impl HistoricalSource for ArchiveSource {
    fn name(&self) -> &str {
        "archive"
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<DailyRecord>, SourceError> {
        let path = self.path_for(ticker);
        if !path.is_file() {
            return Err(SourceError::SymbolNotFound {
                ticker: ticker.to_string(),
            });
        }
        self.parse(ticker, &path)
    }
}
