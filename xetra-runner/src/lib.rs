//! Xetra Runner: configuration, report loading and pipeline orchestration.
//!
//! Sits on top of `xetra-core`:
//! - TOML `ReportConfig` with validation
//! - Parquet report writer/reader with BLAKE3 fingerprint
//! - `run_daily_report` (single ETL pass) and `run_pipeline` (plan, ETL, ledger)

pub mod config;
pub mod loader;
pub mod runner;

pub use config::{report_key, ConfigError, ReportConfig};
pub use loader::{load, read_report};
pub use runner::{plan_next, run_daily_report, run_pipeline, ReportOutcome, RunError, RunSummary};
