//! TradeRecord: one raw Xetra time-bucket row.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One instrument's trading activity for one time bucket of one day.
///
/// Built from a raw source row after projection and null filtering; never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub isin: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start_price: f64,
    pub end_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub traded_volume: f64,
}

impl TradeRecord {
    /// Grouping key used by the daily aggregation.
    pub fn group_key(&self) -> (&str, NaiveDate) {
        (&self.isin, self.date)
    }
}
