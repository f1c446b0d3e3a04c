//! Incremental planning against the ledger.
//!
//! One run processes one source date: the earliest date in the inclusive
//! window that the ledger has not recorded yet. A backlog of several days is
//! worked off one run at a time.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::info;

use crate::error::DataError;
use crate::ledger::Ledger;
use crate::store::ObjectStore;

/// Every calendar date from `start` through `end`, inclusive.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

/// Dates in `start..=end` not present in `processed`, ascending.
pub fn unprocessed_dates(
    start: NaiveDate,
    end: NaiveDate,
    processed: &BTreeSet<NaiveDate>,
) -> Vec<NaiveDate> {
    date_range(start, end)
        .into_iter()
        .filter(|d| !processed.contains(d))
        .collect()
}

/// Earliest date in `start..=end` missing from the ledger.
///
/// Fails with [`DataError::NotFound`] when the ledger object does not exist
/// and [`DataError::EmptyResult`] when every date in the window (or the
/// window itself, if `end < start`) is already covered.
pub fn missing_dates(
    store: &dyn ObjectStore,
    ledger_container: &str,
    ledger_key: &str,
    start: NaiveDate,
    end: NaiveDate,
    date_format: &str,
) -> Result<NaiveDate, DataError> {
    let ledger = Ledger::read(store, ledger_container, ledger_key, date_format)?;
    let missing = unprocessed_dates(start, end, &ledger.processed_dates());

    let next = missing
        .first()
        .copied()
        .ok_or(DataError::EmptyResult { start, end })?;

    info!(
        %start,
        %end,
        outstanding = missing.len(),
        next = %next,
        "planned next source date"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;

    const FMT: &str = "%Y-%m-%d";
    const KEY: &str = "meta_file.csv";

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 4, d).unwrap()
    }

    fn store_with_ledger(dates: &[u32]) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        let mut ledger = Ledger::new();
        for d in dates {
            ledger.append(date(*d), date(25).and_hms_opt(0, 0, 0).unwrap());
        }
        ledger.write(&store, "trg", KEY, FMT).unwrap();
        store
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(date_range(date(22), date(25)).len(), 4);
        assert_eq!(date_range(date(22), date(22)), vec![date(22)]);
        assert!(date_range(date(25), date(22)).is_empty());
    }

    #[test]
    fn empty_ledger_returns_start() {
        let store = store_with_ledger(&[]);
        let next = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        assert_eq!(next, date(22));
    }

    #[test]
    fn skips_processed_dates() {
        let store = store_with_ledger(&[22, 23]);
        let next = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        assert_eq!(next, date(24));
    }

    #[test]
    fn fills_gaps_before_later_dates() {
        let store = store_with_ledger(&[22, 24]);
        let next = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        assert_eq!(next, date(23));
    }

    #[test]
    fn dates_outside_window_are_irrelevant() {
        let store = store_with_ledger(&[1, 2, 3]);
        let next = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        assert_eq!(next, date(22));
    }

    #[test]
    fn idempotent_on_unchanged_ledger() {
        let store = store_with_ledger(&[22]);
        let first = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        let second = missing_dates(&store, "trg", KEY, date(22), date(25), FMT).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn fully_processed_window_is_empty_result() {
        let store = store_with_ledger(&[22, 23, 24, 25]);
        let result = missing_dates(&store, "trg", KEY, date(22), date(25), FMT);
        assert!(matches!(result, Err(DataError::EmptyResult { .. })));
    }

    #[test]
    fn missing_ledger_is_not_found() {
        let store = MemoryObjectStore::new();
        let result = missing_dates(&store, "trg", KEY, date(22), date(25), FMT);
        assert!(matches!(result, Err(DataError::NotFound { .. })));
    }
}
