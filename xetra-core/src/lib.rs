//! Xetra Core: trade records, object store adapter, extract/transform, ledger planning.
//!
//! This crate contains everything a daily report run needs below the
//! orchestration layer:
//! - Domain types (raw trade records, daily aggregates)
//! - Object store trait with filesystem and in-memory backends
//! - CSV/Parquet table codecs over the store
//! - Extract (source discovery and concatenation) and transform (daily aggregation)
//! - Metadata ledger and missing-date planning

pub mod domain;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod plan;
pub mod report;
pub mod schema;
pub mod store;
pub mod table;
pub mod transform;

pub use domain::{DailyAggregate, TradeRecord};
pub use error::DataError;
pub use extract::{extract, source_keys_for_date};
pub use ledger::{init_ledger, update_ledger, Ledger, LedgerEntry};
pub use plan::missing_dates;
pub use schema::{ReportSchema, SourceColumns};
pub use store::{LocalObjectStore, MemoryObjectStore, ObjectInfo, ObjectStore};
pub use table::{fetch_table, store_table, TableFormat};
pub use transform::transform;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the store backends and domain types can cross threads,
    /// so a scheduler may hold them without wrapping.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<TradeRecord>();
        require_sync::<TradeRecord>();
        require_send::<DailyAggregate>();
        require_sync::<DailyAggregate>();
        require_send::<Ledger>();
        require_sync::<Ledger>();
        require_send::<LocalObjectStore>();
        require_sync::<LocalObjectStore>();
        require_send::<MemoryObjectStore>();
        require_sync::<MemoryObjectStore>();
    }

    /// The store trait stays object safe; the pipeline passes `&dyn ObjectStore`.
    #[test]
    fn object_store_is_object_safe() {
        let store = MemoryObjectStore::new();
        let dyn_store: &dyn ObjectStore = &store;
        assert_eq!(dyn_store.name(), "memory");
    }
}
