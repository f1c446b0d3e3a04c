//! Domain types for the daily report

pub mod aggregate;
pub mod trade;

pub use aggregate::DailyAggregate;
pub use trade::TradeRecord;
