//! SQLite store for the symbol catalog and its price/volume history.
//!
//! The store is an explicitly constructed handle passed into the loader and
//! ingestor; schema creation is an idempotent setup call, not a side effect
//! of opening the connection. All writes go through transactions so a
//! symbol's batch lands atomically or not at all.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

/// A catalog row as read back for ingestion.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: i64,
    pub ticker: String,
}

/// A catalog row to be inserted. `name` is optional; list files in the wild
/// sometimes carry a bare ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub ticker: String,
    pub name: Option<String>,
}

/// One price point for a symbol: the open or close of a trading day,
/// normalized to UTC. Open and close are separate rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceObservation {
    pub time: DateTime<Utc>,
    pub price: Decimal,
}

/// Traded volume for one trading day, recorded at the close instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeObservation {
    pub time: DateTime<Utc>,
    pub volume: u64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("stored decimal '{0}' is not parseable")]
    BadDecimal(String),

    #[error("stored timestamp '{0}' is not parseable")]
    BadTimestamp(String),

    #[error("volume {0} exceeds the storable range")]
    VolumeOutOfRange(u64),
}

/// Handle over the relational store. One connection, used serially.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if missing) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// Create the schema if it is not already present. Safe to call on
    /// every run.
    pub fn create_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS symbols (
                 id     INTEGER PRIMARY KEY,
                 symbol TEXT NOT NULL UNIQUE,
                 name   TEXT
             );
             CREATE TABLE IF NOT EXISTS prices (
                 id        INTEGER PRIMARY KEY,
                 symbol_id INTEGER NOT NULL REFERENCES symbols(id),
                 time      TEXT NOT NULL,
                 price     TEXT NOT NULL,
                 UNIQUE (symbol_id, time)
             );
             CREATE INDEX IF NOT EXISTS idx_prices_symbol ON prices(symbol_id);
             CREATE TABLE IF NOT EXISTS volumes (
                 id        INTEGER PRIMARY KEY,
                 symbol_id INTEGER NOT NULL REFERENCES symbols(id),
                 time      TEXT NOT NULL,
                 volume    INTEGER NOT NULL,
                 UNIQUE (symbol_id, time)
             );
             CREATE INDEX IF NOT EXISTS idx_volumes_symbol ON volumes(symbol_id);",
        )?;
        Ok(())
    }

    /// Number of rows in the symbol catalog.
    pub fn symbol_count(&self) -> Result<i64, StoreError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(id) FROM symbols", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of price rows for one symbol.
    pub fn price_count(&self, symbol_id: i64) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(id) FROM prices WHERE symbol_id = ?1",
            params![symbol_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of volume rows for one symbol.
    pub fn volume_count(&self, symbol_id: i64) -> Result<i64, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(id) FROM volumes WHERE symbol_id = ?1",
            params![symbol_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Batch-insert catalog rows in one transaction.
    pub fn insert_symbols(&mut self, records: &[SymbolRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO symbols (symbol, name) VALUES (?1, ?2)")?;
            for record in records {
                stmt.execute(params![record.ticker, record.name])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = records.len(), "inserted symbol catalog rows");
        Ok(())
    }

    /// Insert one symbol's full observation batch atomically: both tables
    /// under a single transaction, so an interrupted run leaves the symbol
    /// with zero rows rather than a partial set.
    pub fn insert_observations(
        &mut self,
        symbol_id: i64,
        prices: &[PriceObservation],
        volumes: &[VolumeObservation],
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO prices (symbol_id, time, price) VALUES (?1, ?2, ?3)")?;
            for obs in prices {
                stmt.execute(params![
                    symbol_id,
                    encode_time(obs.time),
                    obs.price.to_string()
                ])?;
            }
        }
        {
            let mut stmt =
                tx.prepare("INSERT INTO volumes (symbol_id, time, volume) VALUES (?1, ?2, ?3)")?;
            for obs in volumes {
                let volume = i64::try_from(obs.volume)
                    .map_err(|_| StoreError::VolumeOutOfRange(obs.volume))?;
                stmt.execute(params![symbol_id, encode_time(obs.time), volume])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Display name recorded for a ticker, if the ticker is in the catalog.
    pub fn symbol_name(&self, ticker: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM symbols WHERE symbol = ?1")?;
        let mut rows = stmt.query_map(params![ticker], |row| row.get::<_, Option<String>>(0))?;
        match rows.next() {
            Some(name) => Ok(name?),
            None => Ok(None),
        }
    }

    /// All catalog rows in id order (the order they were loaded).
    pub fn all_symbols(&self) -> Result<Vec<Symbol>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, symbol FROM symbols ORDER BY id")?;
        let symbols = stmt
            .query_map([], |row| {
                Ok(Symbol {
                    id: row.get(0)?,
                    ticker: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(symbols)
    }

    /// Price rows for one symbol in time order, for verification and tests.
    pub fn prices_for(
        &self,
        symbol_id: i64,
    ) -> Result<Vec<PriceObservation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT time, price FROM prices WHERE symbol_id = ?1 ORDER BY time",
        )?;
        let rows = stmt
            .query_map(params![symbol_id], |row| {
                let time: String = row.get(0)?;
                let price: String = row.get(1)?;
                Ok((time, price))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(time, price)| {
                Ok(PriceObservation {
                    time: decode_time(&time)?,
                    price: price
                        .parse::<Decimal>()
                        .map_err(|_| StoreError::BadDecimal(price))?,
                })
            })
            .collect()
    }
}

fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::BadTimestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.create_schema().unwrap();
        store
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let store = store();
        store.create_schema().unwrap();
        assert_eq!(store.symbol_count().unwrap(), 0);
    }

    #[test]
    fn symbol_batch_insert_and_readback() {
        let mut store = store();
        store
            .insert_symbols(&[
                SymbolRecord {
                    ticker: "AAA".into(),
                    name: Some("Alpha".into()),
                },
                SymbolRecord {
                    ticker: "BBB".into(),
                    name: None,
                },
            ])
            .unwrap();

        assert_eq!(store.symbol_count().unwrap(), 2);
        let symbols = store.all_symbols().unwrap();
        assert_eq!(symbols[0].ticker, "AAA");
        assert_eq!(symbols[1].ticker, "BBB");
    }

    #[test]
    fn duplicate_ticker_violates_unique_constraint() {
        let mut store = store();
        let record = SymbolRecord {
            ticker: "AAA".into(),
            name: None,
        };
        let result = store.insert_symbols(&[record.clone(), record]);
        assert!(result.is_err());
        // The failed transaction rolled back entirely.
        assert_eq!(store.symbol_count().unwrap(), 0);
    }

    #[test]
    fn observation_insert_is_atomic_per_symbol() {
        let mut store = store();
        store
            .insert_symbols(&[SymbolRecord {
                ticker: "AAA".into(),
                name: None,
            }])
            .unwrap();
        let id = store.all_symbols().unwrap()[0].id;

        let time = utc(2024, 1, 2, 21, 0);
        let prices = vec![
            PriceObservation {
                time,
                price: "10.75".parse().unwrap(),
            },
            // Same (symbol, time) twice: the whole batch must roll back.
            PriceObservation {
                time,
                price: "10.76".parse().unwrap(),
            },
        ];
        assert!(store.insert_observations(id, &prices, &[]).is_err());
        assert_eq!(store.price_count(id).unwrap(), 0);
    }

    #[test]
    fn duplicate_volume_time_rolls_back_the_batch() {
        let mut store = store();
        store
            .insert_symbols(&[SymbolRecord {
                ticker: "AAA".into(),
                name: None,
            }])
            .unwrap();
        let id = store.all_symbols().unwrap()[0].id;

        let time = utc(2024, 1, 2, 21, 0);
        let volumes = vec![
            VolumeObservation { time, volume: 1000 },
            VolumeObservation { time, volume: 2000 },
        ];
        assert!(store.insert_observations(id, &[], &volumes).is_err());
        assert_eq!(store.volume_count(id).unwrap(), 0);
    }

    #[test]
    fn volume_beyond_i64_is_rejected_not_wrapped() {
        let mut store = store();
        store
            .insert_symbols(&[SymbolRecord {
                ticker: "AAA".into(),
                name: None,
            }])
            .unwrap();
        let id = store.all_symbols().unwrap()[0].id;

        let volumes = vec![VolumeObservation {
            time: utc(2024, 1, 2, 21, 0),
            volume: u64::MAX,
        }];
        let err = store.insert_observations(id, &[], &volumes).unwrap_err();
        assert!(matches!(err, StoreError::VolumeOutOfRange(v) if v == u64::MAX));
        assert_eq!(store.volume_count(id).unwrap(), 0);
    }

    #[test]
    fn prices_round_trip_exactly() {
        let mut store = store();
        store
            .insert_symbols(&[SymbolRecord {
                ticker: "AAA".into(),
                name: None,
            }])
            .unwrap();
        let id = store.all_symbols().unwrap()[0].id;

        let inserted = vec![
            PriceObservation {
                time: utc(2024, 1, 2, 14, 30),
                price: "10.50".parse().unwrap(),
            },
            PriceObservation {
                time: utc(2024, 1, 2, 21, 0),
                price: "10.75".parse().unwrap(),
            },
        ];
        store.insert_observations(id, &inserted, &[]).unwrap();

        let read = store.prices_for(id).unwrap();
        assert_eq!(read, inserted);
    }

    #[test]
    fn volume_counts_are_per_symbol() {
        let mut store = store();
        store
            .insert_symbols(&[
                SymbolRecord {
                    ticker: "AAA".into(),
                    name: None,
                },
                SymbolRecord {
                    ticker: "BBB".into(),
                    name: None,
                },
            ])
            .unwrap();
        let symbols = store.all_symbols().unwrap();

        store
            .insert_observations(
                symbols[0].id,
                &[],
                &[VolumeObservation {
                    time: utc(2024, 1, 2, 21, 0),
                    volume: 1000,
                }],
            )
            .unwrap();

        assert_eq!(store.volume_count(symbols[0].id).unwrap(), 1);
        assert_eq!(store.volume_count(symbols[1].id).unwrap(), 0);
    }
}
