//! Load: write the daily report as Parquet and read it back.

use tracing::info;
use xetra_core::report::{aggregates_to_dataframe, dataframe_to_aggregates};
use xetra_core::{fetch_table, store_table, DailyAggregate, DataError, ObjectStore, TableFormat};

/// Write `aggregates` to `container/key` as Parquet, replacing any existing
/// object. Returns the BLAKE3 hex digest of the written bytes.
pub fn load(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    aggregates: &[DailyAggregate],
) -> Result<String, DataError> {
    let df = aggregates_to_dataframe(aggregates)?;
    let bytes = store_table(store, container, key, &df, TableFormat::Parquet)?;
    let hash = blake3::hash(&bytes).to_hex().to_string();

    info!(
        container,
        key,
        rows = aggregates.len(),
        bytes = bytes.len(),
        %hash,
        "report written"
    );
    Ok(hash)
}

/// Read a report previously written by [`load`].
pub fn read_report(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
) -> Result<Vec<DailyAggregate>, DataError> {
    let df = fetch_table(store, container, key, TableFormat::Parquet)?;
    dataframe_to_aggregates(key, &df)
}
