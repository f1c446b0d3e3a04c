//! Extract: source object discovery and raw table concatenation.

use chrono::NaiveDate;
use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::DataError;
use crate::store::ObjectStore;
use crate::table::{fetch_table, TableFormat};

/// Keys in `container` whose first path segment is `date`.
///
/// Keys that do not start with a date in `date_format` are skipped.
pub fn source_keys_for_date(
    store: &dyn ObjectStore,
    container: &str,
    date: NaiveDate,
    date_format: &str,
) -> Result<Vec<String>, DataError> {
    let mut keys = Vec::new();
    for object in store.list(container)? {
        match object.source_date(date_format) {
            Some(d) if d == date => keys.push(object.key),
            Some(_) => {}
            None => debug!(key = %object.key, "skipping object without a date prefix"),
        }
    }
    Ok(keys)
}

/// Fetch every key as a CSV table and concatenate them in order.
///
/// Columns are aligned by name; a column missing from one file is null for
/// that file's rows. The first fetch or decode error aborts the extract.
/// No keys yields an empty table.
pub fn extract(
    store: &dyn ObjectStore,
    container: &str,
    keys: &[String],
) -> Result<DataFrame, DataError> {
    if keys.is_empty() {
        return Ok(DataFrame::empty());
    }

    let mut frames = Vec::with_capacity(keys.len());
    for key in keys {
        let df = fetch_table(store, container, key, TableFormat::Csv)?;
        debug!(%key, rows = df.height(), "fetched source object");
        frames.push(df);
    }

    let combined = concat_df_diagonal(&frames)
        .map_err(|e| DataError::decode(keys.join(", "), format!("concatenation failed: {e}")))?;

    info!(
        container,
        objects = keys.len(),
        rows = combined.height(),
        "extracted raw table"
    );
    Ok(combined)
}
