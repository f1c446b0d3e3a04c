//! Metadata ledger: which source dates already produced a report.
//!
//! Persisted as CSV with the header `source_date,datetime_of_processing`.
//! The ledger is append-only: entries are never edited or removed, and a
//! date already present is not appended a second time.
//!
//! Rows with an empty `source_date` are ignored on read; older ledgers
//! written by hand sometimes contain them.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DataError;
use crate::store::ObjectStore;

/// Timestamp layout of `datetime_of_processing`.
pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 2] = ["source_date", "datetime_of_processing"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub source_date: NaiveDate,
    pub datetime_of_processing: NaiveDateTime,
}

/// Raw CSV row before date parsing.
#[derive(Debug, Deserialize)]
struct LedgerRow {
    source_date: Option<String>,
    datetime_of_processing: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct processed source dates.
    pub fn processed_dates(&self) -> BTreeSet<NaiveDate> {
        self.entries.iter().map(|e| e.source_date).collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.source_date == date)
    }

    /// Record `date` as processed at `processed_at`.
    ///
    /// Returns `false` (and leaves the ledger unchanged) if the date is already
    /// recorded.
    pub fn append(&mut self, date: NaiveDate, processed_at: NaiveDateTime) -> bool {
        if self.contains(date) {
            return false;
        }
        self.entries.push(LedgerEntry {
            source_date: date,
            datetime_of_processing: processed_at,
        });
        true
    }

    /// Parse ledger CSV. `key` is only used in error messages.
    pub fn from_csv(key: &str, bytes: &[u8], date_format: &str) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let mut entries = Vec::new();
        for (i, row) in reader.deserialize::<LedgerRow>().enumerate() {
            let row = row.map_err(|e| DataError::decode(key, e))?;
            let Some(source_date) = row.source_date.filter(|s| !s.is_empty()) else {
                continue;
            };

            let source_date = NaiveDate::parse_from_str(&source_date, date_format).map_err(|_| {
                DataError::decode(
                    key,
                    format!("row {i}: source_date '{source_date}' does not match '{date_format}'"),
                )
            })?;
            let processed = row.datetime_of_processing.unwrap_or_default();
            let datetime_of_processing = parse_processed_at(&processed).ok_or_else(|| {
                DataError::decode(
                    key,
                    format!("row {i}: datetime_of_processing '{processed}' is not a timestamp"),
                )
            })?;

            entries.push(LedgerEntry {
                source_date,
                datetime_of_processing,
            });
        }

        Ok(Self { entries })
    }

    /// Serialize as ledger CSV (header always written).
    pub fn to_csv(&self, key: &str, date_format: &str) -> Result<Vec<u8>, DataError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(HEADER).map_err(|e| DataError::write(key, e))?;
        for entry in &self.entries {
            wtr.write_record([
                entry.source_date.format(date_format).to_string(),
                entry
                    .datetime_of_processing
                    .format(PROCESSED_AT_FORMAT)
                    .to_string(),
            ])
            .map_err(|e| DataError::write(key, e))?;
        }
        wtr.into_inner().map_err(|e| DataError::write(key, e))
    }

    /// Read the ledger object. A missing object is [`DataError::NotFound`].
    pub fn read(
        store: &dyn ObjectStore,
        container: &str,
        key: &str,
        date_format: &str,
    ) -> Result<Self, DataError> {
        let bytes = store.get(container, key)?;
        Self::from_csv(key, &bytes, date_format)
    }

    /// Overwrite the ledger object with this ledger.
    pub fn write(
        &self,
        store: &dyn ObjectStore,
        container: &str,
        key: &str,
        date_format: &str,
    ) -> Result<(), DataError> {
        let bytes = self.to_csv(key, date_format)?;
        store.put(container, key, &bytes)
    }
}

/// Accepts full timestamps and bare dates (midnight).
fn parse_processed_at(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, PROCESSED_AT_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Write an empty ledger if none exists. Returns whether one was created.
pub fn init_ledger(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    date_format: &str,
) -> Result<bool, DataError> {
    if store.exists(container, key)? {
        return Ok(false);
    }
    Ledger::new().write(store, container, key, date_format)?;
    info!(container, key, "created empty ledger");
    Ok(true)
}

/// Read-append-write the ledger with one processed date.
///
/// Returns `false` if the date was already recorded (nothing written).
pub fn update_ledger(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    date: NaiveDate,
    processed_at: NaiveDateTime,
    date_format: &str,
) -> Result<bool, DataError> {
    let mut ledger = Ledger::read(store, container, key, date_format)?;
    if !ledger.append(date, processed_at) {
        return Ok(false);
    }
    ledger.write(store, container, key, date_format)?;
    info!(container, key, source_date = %date, "ledger updated");
    Ok(true)
}
