//! DailyAggregate: the report row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Summary of one instrument for one trading day.
///
/// `prev_closing_price` carries the closing price of the *next later* date
/// present for the same instrument, so it is `None` on an instrument's most
/// recent day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub isin: String,
    pub date: NaiveDate,
    pub opening_price_eur: f64,
    pub closing_price_eur: f64,
    pub minimum_price_eur: f64,
    pub maximum_price_eur: f64,
    pub daily_traded_volume: f64,
    pub prev_closing_price: Option<f64>,
}
