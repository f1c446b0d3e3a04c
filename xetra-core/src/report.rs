//! DailyAggregate ↔ DataFrame conversion for the Parquet report.

use chrono::{DateTime, NaiveDate, Utc};
use polars::prelude::*;

use crate::domain::DailyAggregate;
use crate::error::DataError;
use crate::schema::ReportSchema;

fn epoch() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// Convert aggregates to a DataFrame in report column order.
pub fn aggregates_to_dataframe(rows: &[DailyAggregate]) -> Result<DataFrame, DataError> {
    let map_err = |e: PolarsError| DataError::write("report", format!("dataframe creation: {e}"));

    let isins: Vec<&str> = rows.iter().map(|r| r.isin.as_str()).collect();
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch()).num_days() as i32)
        .collect();
    let opens: Vec<f64> = rows.iter().map(|r| r.opening_price_eur).collect();
    let closes: Vec<f64> = rows.iter().map(|r| r.closing_price_eur).collect();
    let mins: Vec<f64> = rows.iter().map(|r| r.minimum_price_eur).collect();
    let maxs: Vec<f64> = rows.iter().map(|r| r.maximum_price_eur).collect();
    let volumes: Vec<f64> = rows.iter().map(|r| r.daily_traded_volume).collect();
    let prev_closes: Vec<Option<f64>> = rows.iter().map(|r| r.prev_closing_price).collect();

    DataFrame::new(vec![
        Column::new(ReportSchema::ISIN.into(), isins),
        Column::new(ReportSchema::DATE.into(), dates)
            .cast(&DataType::Date)
            .map_err(map_err)?,
        Column::new(ReportSchema::OPENING_PRICE.into(), opens),
        Column::new(ReportSchema::CLOSING_PRICE.into(), closes),
        Column::new(ReportSchema::MINIMUM_PRICE.into(), mins),
        Column::new(ReportSchema::MAXIMUM_PRICE.into(), maxs),
        Column::new(ReportSchema::TRADED_VOLUME.into(), volumes),
        Column::new(ReportSchema::PREV_CLOSING_PRICE.into(), prev_closes),
    ])
    .map_err(map_err)
}

/// Convert a report DataFrame back to aggregates.
///
/// `key` is only used in error messages.
pub fn dataframe_to_aggregates(key: &str, df: &DataFrame) -> Result<Vec<DailyAggregate>, DataError> {
    ReportSchema::validate(df).map_err(|e| DataError::decode(key, e))?;
    let map_err = |e: PolarsError| DataError::decode(key, format!("column read: {e}"));

    let isin_ca = df.column(ReportSchema::ISIN).map_err(map_err)?.str().map_err(map_err)?;
    let date_ca = df.column(ReportSchema::DATE).map_err(map_err)?.date().map_err(map_err)?;
    let float = |name: &str| -> Result<Float64Chunked, DataError> {
        df.column(name)
            .and_then(|c| c.f64().cloned())
            .map_err(map_err)
    };
    let open_ca = float(ReportSchema::OPENING_PRICE)?;
    let close_ca = float(ReportSchema::CLOSING_PRICE)?;
    let min_ca = float(ReportSchema::MINIMUM_PRICE)?;
    let max_ca = float(ReportSchema::MAXIMUM_PRICE)?;
    let vol_ca = float(ReportSchema::TRADED_VOLUME)?;
    let prev_ca = float(ReportSchema::PREV_CLOSING_PRICE)?;

    let required = |value: Option<f64>, column: &str, row: usize| {
        value.ok_or_else(|| DataError::decode(key, format!("null {column} at row {row}")))
    };

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let isin = isin_ca
            .get(i)
            .ok_or_else(|| DataError::decode(key, format!("null ISIN at row {i}")))?;
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::decode(key, format!("null Date at row {i}")))?;

        rows.push(DailyAggregate {
            isin: isin.to_string(),
            date: epoch() + chrono::Duration::days(days as i64),
            opening_price_eur: required(open_ca.get(i), ReportSchema::OPENING_PRICE, i)?,
            closing_price_eur: required(close_ca.get(i), ReportSchema::CLOSING_PRICE, i)?,
            minimum_price_eur: required(min_ca.get(i), ReportSchema::MINIMUM_PRICE, i)?,
            maximum_price_eur: required(max_ca.get(i), ReportSchema::MAXIMUM_PRICE, i)?,
            daily_traded_volume: required(vol_ca.get(i), ReportSchema::TRADED_VOLUME, i)?,
            prev_closing_price: prev_ca.get(i),
        });
    }

    Ok(rows)
}
