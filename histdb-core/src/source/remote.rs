//! Remote quote API source.
//!
//! The collaborator exposes two calls: a symbol lookup returning the
//! supported date range (or nothing), and a daily-quote fetch over a range.
//! Both are modeled as a trait so the ingest path can be exercised against a
//! mock, and so "symbol unknown" is a typed result instead of a swallowed
//! exception.
//!
//! Prices travel as decimal strings in the JSON payload and deserialize
//! losslessly into `Decimal`; no binary floating point touches a price.

use super::{DailyRecord, HistoricalSource, SourceError};
use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Supported history range for a symbol, from the lookup call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SymbolInfo {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One day of quotes from the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyQuote {
    pub date: NaiveDate,
    pub open: Decimal,
    pub close: Decimal,
}

/// The remote collaborator's wire contract.
pub trait QuoteApi {
    /// Resolve a ticker to its supported history range. `None` means the
    /// remote side does not know the symbol.
    fn lookup(&self, ticker: &str) -> Result<Option<SymbolInfo>, SourceError>;

    /// Daily open/close quotes over `[start, end]`. A range the remote side
    /// rejects comes back as `SourceError::InvalidRange`.
    fn daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>, SourceError>;
}

/// Blocking HTTP implementation of the quote API.
pub struct HttpQuoteApi {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpQuoteApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl QuoteApi for HttpQuoteApi {
    fn lookup(&self, ticker: &str) -> Result<Option<SymbolInfo>, SourceError> {
        let url = format!("{}/v1/info/{ticker}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!("HTTP {status} for {url}")));
        }

        resp.json::<SymbolInfo>()
            .map(Some)
            .map_err(|e| SourceError::Malformed {
                ticker: ticker.to_string(),
                detail: format!("info payload: {e}"),
            })
    }

    fn daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyQuote>, SourceError> {
        let url = format!(
            "{}/v1/daily/{ticker}?start={}&end={}",
            self.base_url,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            return Err(SourceError::InvalidRange {
                ticker: ticker.to_string(),
                start,
                end,
            });
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::SymbolNotFound {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!("HTTP {status} for {url}")));
        }

        resp.json::<Vec<DailyQuote>>()
            .map_err(|e| SourceError::Malformed {
                ticker: ticker.to_string(),
                detail: format!("daily payload: {e}"),
            })
    }
}

/// Historical source backed by a remote quote API.
pub struct RemoteSource<C: QuoteApi> {
    api: C,
    today: NaiveDate,
}

impl<C: QuoteApi> RemoteSource<C> {
    pub fn new(api: C) -> Self {
        Self::with_today(api, Utc::now().date_naive())
    }

    /// Pin "today" for the range-correction retry; tests use this.
    pub fn with_today(api: C, today: NaiveDate) -> Self {
        Self { api, today }
    }

    /// The corrected range after an invalid-range rejection: start clamped
    /// to January 1 of the advertised start year, end extended to today.
    fn corrected_range(&self, info: SymbolInfo) -> (NaiveDate, NaiveDate) {
        let start = NaiveDate::from_ymd_opt(info.start.year(), 1, 1).unwrap();
        (start, self.today)
    }
}

impl<C: QuoteApi> HistoricalSource for RemoteSource<C> {
    fn name(&self) -> &str {
        "remote"
    }

    fn fetch(&self, ticker: &str) -> Result<Vec<DailyRecord>, SourceError> {
        let info = match self.api.lookup(ticker) {
            Ok(Some(info)) => info,
            Ok(None) => {
                return Err(SourceError::SymbolNotFound {
                    ticker: ticker.to_string(),
                })
            }
            // Any lookup-phase failure is a per-symbol soft skip; only the
            // data fetch itself can abort the run.
            Err(e) => {
                return Err(SourceError::Malformed {
                    ticker: ticker.to_string(),
                    detail: format!("lookup failed: {e}"),
                })
            }
        };

        let quotes = match self.api.daily(ticker, info.start, info.end) {
            Ok(quotes) => quotes,
            Err(SourceError::InvalidRange { .. }) => {
                let (start, end) = self.corrected_range(info);
                tracing::debug!(ticker, %start, %end, "range rejected, retrying corrected");
                self.api.daily(ticker, start, end)?
            }
            Err(e) => return Err(e),
        };

        Ok(quotes
            .into_iter()
            .map(|q| DailyRecord {
                date: q.date,
                open: Some(q.open),
                close: q.close,
                volume: None,
            })
            .collect())
    }
}
