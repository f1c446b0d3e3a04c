//! Transform: raw trade rows → one aggregate per instrument per day.
//!
//! The raw table is projected onto the configured [`SourceColumns`], rows
//! with any null in those columns (including null markers such as `NA` and
//! prices that parse to NaN) are dropped, and the remainder is typed
//! into [`TradeRecord`]s. Aggregation then runs over the typed records:
//!
//! 1. stable sort by time, so the first row of a group is its opening bucket
//!    and the last row its closing bucket (equal times keep input order);
//! 2. group by (ISIN, date) accumulating open/close/min/max/volume;
//! 3. within each ISIN, in date order, `prev_closing_price` takes the closing
//!    price of the following date's row.
//!
//! Every stage returns new values; the input table is never touched.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::{DailyAggregate, TradeRecord};
use crate::error::DataError;
use crate::schema::SourceColumns;
use crate::table::is_null_marker;

const TABLE_NAME: &str = "raw table";

/// Aggregate a raw table into daily per-instrument rows.
///
/// `reference_date` is accepted for callers that may later restrict the
/// output window; it does not affect the result. Output is ordered by ISIN,
/// then date.
pub fn transform(
    table: &DataFrame,
    columns: &SourceColumns,
    date_format: &str,
    reference_date: NaiveDate,
) -> Result<Vec<DailyAggregate>, DataError> {
    let records = to_trade_records(table, columns, date_format)?;
    let aggregates = aggregate_daily(&records);

    info!(
        %reference_date,
        input_rows = table.height(),
        kept_rows = records.len(),
        aggregates = aggregates.len(),
        "transformed raw table"
    );
    Ok(aggregates)
}

/// Project onto the selected columns, drop rows with nulls, and type the rest.
pub fn to_trade_records(
    table: &DataFrame,
    columns: &SourceColumns,
    date_format: &str,
) -> Result<Vec<TradeRecord>, DataError> {
    if table.height() == 0 {
        return Ok(Vec::new());
    }

    let text = |name: &str| -> Result<StringChunked, DataError> {
        let column = table
            .column(name)
            .map_err(|_| DataError::decode(TABLE_NAME, format!("missing column '{name}'")))?;
        let as_str = column
            .cast(&DataType::String)
            .map_err(|e| DataError::decode(TABLE_NAME, format!("column '{name}': {e}")))?;
        as_str
            .str()
            .cloned()
            .map_err(|e| DataError::decode(TABLE_NAME, format!("column '{name}': {e}")))
    };

    let isin = text(&columns.isin)?;
    let date = text(&columns.date)?;
    let time = text(&columns.time)?;
    let start = text(&columns.start_price)?;
    let max = text(&columns.max_price)?;
    let min = text(&columns.min_price)?;
    let end = text(&columns.end_price)?;
    let volume = text(&columns.traded_volume)?;

    let mut records = Vec::with_capacity(table.height());
    let mut dropped = 0usize;

    for i in 0..table.height() {
        let (
            Some(isin_v),
            Some(date_v),
            Some(time_v),
            Some(start_v),
            Some(max_v),
            Some(min_v),
            Some(end_v),
            Some(volume_v),
        ) = (
            isin.get(i),
            date.get(i),
            time.get(i),
            start.get(i),
            max.get(i),
            min.get(i),
            end.get(i),
            volume.get(i),
        )
        else {
            dropped += 1;
            continue;
        };

        let fields = [isin_v, date_v, time_v, start_v, max_v, min_v, end_v, volume_v];
        if fields.iter().any(|v| is_null_marker(v)) {
            dropped += 1;
            continue;
        }

        let start_price = parse_number(start_v, &columns.start_price, i)?;
        let max_price = parse_number(max_v, &columns.max_price, i)?;
        let min_price = parse_number(min_v, &columns.min_price, i)?;
        let end_price = parse_number(end_v, &columns.end_price, i)?;
        let traded_volume = parse_number(volume_v, &columns.traded_volume, i)?;
        if [start_price, max_price, min_price, end_price, traded_volume]
            .iter()
            .any(|v| v.is_nan())
        {
            dropped += 1;
            continue;
        }
        if traded_volume < 0.0 {
            return Err(DataError::decode(
                TABLE_NAME,
                format!("row {i}: negative '{}' {traded_volume}", columns.traded_volume),
            ));
        }

        records.push(TradeRecord {
            isin: isin_v.to_string(),
            date: parse_date(date_v, date_format, &columns.date, i)?,
            time: parse_time(time_v, &columns.time, i)?,
            start_price,
            end_price,
            min_price,
            max_price,
            traded_volume,
        });
    }

    if dropped > 0 {
        debug!(dropped, "dropped rows with null values");
    }
    Ok(records)
}

/// Group typed records by (ISIN, date) and derive the daily aggregates.
pub fn aggregate_daily(records: &[TradeRecord]) -> Vec<DailyAggregate> {
    let mut by_time: Vec<&TradeRecord> = records.iter().collect();
    by_time.sort_by_key(|r| r.time);

    let mut groups: BTreeMap<(&str, NaiveDate), GroupAccumulator> = BTreeMap::new();
    for record in by_time {
        groups
            .entry(record.group_key())
            .and_modify(|acc| acc.push(record))
            .or_insert_with(|| GroupAccumulator::new(record));
    }

    let mut aggregates: Vec<DailyAggregate> = groups
        .into_iter()
        .map(|((isin, date), acc)| acc.finish(isin, date))
        .collect();

    fill_prev_closing_price(&mut aggregates);
    aggregates
}

/// Set `prev_closing_price` from the next date of the same ISIN.
///
/// Expects rows sorted by (ISIN, date), which the grouping guarantees.
fn fill_prev_closing_price(rows: &mut [DailyAggregate]) {
    for i in 0..rows.len() {
        let prev = rows
            .get(i + 1)
            .filter(|next| next.isin == rows[i].isin)
            .map(|next| next.closing_price_eur);
        rows[i].prev_closing_price = prev;
    }
}

/// Running state for one (ISIN, date) group, fed in time order.
struct GroupAccumulator {
    opening_price: f64,
    closing_price: f64,
    min_price: f64,
    max_price: f64,
    volume: f64,
}

impl GroupAccumulator {
    fn new(first: &TradeRecord) -> Self {
        Self {
            opening_price: first.start_price,
            closing_price: first.end_price,
            min_price: first.min_price,
            max_price: first.max_price,
            volume: first.traded_volume,
        }
    }

    fn push(&mut self, record: &TradeRecord) {
        self.closing_price = record.end_price;
        self.min_price = self.min_price.min(record.min_price);
        self.max_price = self.max_price.max(record.max_price);
        self.volume += record.traded_volume;
    }

    fn finish(self, isin: &str, date: NaiveDate) -> DailyAggregate {
        DailyAggregate {
            isin: isin.to_string(),
            date,
            opening_price_eur: self.opening_price,
            closing_price_eur: self.closing_price,
            minimum_price_eur: self.min_price,
            maximum_price_eur: self.max_price,
            daily_traded_volume: self.volume,
            prev_closing_price: None,
        }
    }
}

fn parse_number(value: &str, column: &str, row: usize) -> Result<f64, DataError> {
    value.trim().parse::<f64>().map_err(|_| {
        DataError::decode(
            TABLE_NAME,
            format!("row {row}: '{column}' value '{value}' is not a number"),
        )
    })
}

fn parse_date(value: &str, format: &str, column: &str, row: usize) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(value.trim(), format).map_err(|_| {
        DataError::decode(
            TABLE_NAME,
            format!("row {row}: '{column}' value '{value}' does not match '{format}'"),
        )
    })
}

fn parse_time(value: &str, column: &str, row: usize) -> Result<NaiveTime, DataError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            DataError::decode(
                TABLE_NAME,
                format!("row {row}: '{column}' value '{value}' is not a time of day"),
            )
        })
}
