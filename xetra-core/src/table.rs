//! Tabular codecs on top of the object store.
//!
//! CSV objects are decoded with every column as a string so that source
//! files with differing inferred types still concatenate cleanly; typing
//! happens in the transform. Parquet objects keep their stored schema.

use std::io::Cursor;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::store::ObjectStore;

/// Field values read as null in CSV sources, in addition to empty fields.
pub const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether `value` is one of the [`NULL_MARKERS`].
pub fn is_null_marker(value: &str) -> bool {
    NULL_MARKERS.contains(&value.trim())
}

/// Encoding of a stored table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Comma-delimited UTF-8 text with a header row.
    Csv,
    /// Columnar binary.
    Parquet,
}

/// Fetch the object at `key` and decode it as a table.
pub fn fetch_table(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    format: TableFormat,
) -> Result<DataFrame, DataError> {
    let bytes = store.get(container, key)?;
    decode_table(key, bytes, format)
}

/// Encode `df` and store it at `key`, overwriting any existing object.
pub fn store_table(
    store: &dyn ObjectStore,
    container: &str,
    key: &str,
    df: &DataFrame,
    format: TableFormat,
) -> Result<Vec<u8>, DataError> {
    let bytes = encode_table(key, df, format)?;
    store.put(container, key, &bytes)?;
    Ok(bytes)
}

/// Decode raw bytes as a table. `key` is only used in error messages.
pub fn decode_table(key: &str, bytes: Vec<u8>, format: TableFormat) -> Result<DataFrame, DataError> {
    match format {
        TableFormat::Csv => {
            if std::str::from_utf8(&bytes).is_err() {
                return Err(DataError::decode(key, "CSV content is not valid UTF-8"));
            }
            let null_values = NULL_MARKERS.iter().map(|m| (*m).into()).collect();
            CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .with_parse_options(
                    CsvParseOptions::default()
                        .with_null_values(Some(NullValues::AllColumns(null_values))),
                )
                .into_reader_with_file_handle(Cursor::new(bytes))
                .finish()
                .map_err(|e| DataError::decode(key, e))
        }
        TableFormat::Parquet => ParquetReader::new(Cursor::new(bytes))
            .finish()
            .map_err(|e| DataError::decode(key, e)),
    }
}

/// Encode a table. `key` is only used in error messages.
pub fn encode_table(key: &str, df: &DataFrame, format: TableFormat) -> Result<Vec<u8>, DataError> {
    let mut buf = Vec::new();
    let mut df = df.clone();
    match format {
        TableFormat::Csv => {
            CsvWriter::new(&mut buf)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| DataError::write(key, e))?;
        }
        TableFormat::Parquet => {
            ParquetWriter::new(&mut buf)
                .finish(&mut df)
                .map_err(|e| DataError::write(key, e))?;
        }
    }
    Ok(buf)
}
