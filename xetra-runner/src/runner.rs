//! Report orchestration: plan, extract, transform, load, record.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use xetra_core::{
    extract, missing_dates, source_keys_for_date, transform, update_ledger, DataError,
    ObjectStore, SourceColumns,
};

use crate::config::{report_key, ConfigError, ReportConfig};
use crate::loader::load;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Row counts and output fingerprint of one Extract → Transform → Load pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub raw_rows: usize,
    pub aggregate_rows: usize,
    pub report_hash: String,
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub source_date: NaiveDate,
    pub source_objects: usize,
    pub raw_rows: usize,
    pub aggregate_rows: usize,
    pub target_key: String,
    pub report_hash: String,
    pub ledger_updated: bool,
}

/// Extract `source_keys`, aggregate them and write the report to
/// `target_container/target_key`.
#[allow(clippy::too_many_arguments)]
pub fn run_daily_report(
    store: &dyn ObjectStore,
    source_container: &str,
    target_container: &str,
    source_keys: &[String],
    target_key: &str,
    columns: &SourceColumns,
    date_format: &str,
    reference_date: NaiveDate,
) -> Result<ReportOutcome, RunError> {
    let raw = extract(store, source_container, source_keys)?;
    let aggregates = transform(&raw, columns, date_format, reference_date)?;
    let report_hash = load(store, target_container, target_key, &aggregates)?;

    Ok(ReportOutcome {
        raw_rows: raw.height(),
        aggregate_rows: aggregates.len(),
        report_hash,
    })
}

/// Next source date the pipeline would process.
pub fn plan_next(
    store: &dyn ObjectStore,
    config: &ReportConfig,
    local_today: NaiveDate,
) -> Result<NaiveDate, RunError> {
    let date = missing_dates(
        store,
        &config.target.container,
        &config.ledger.key,
        config.reference_date,
        config.end_date(local_today),
        &config.date_format,
    )?;
    Ok(date)
}

/// Process the earliest unprocessed source date and record it in the ledger.
///
/// A planned date without any source objects is [`DataError::NotFound`]; the
/// run stops before writing and the date stays outstanding.
///
/// `now` is the run timestamp: it names the report key, bounds the window
/// when `config.today` is unset, and is written to the ledger.
pub fn run_pipeline(
    store: &dyn ObjectStore,
    config: &ReportConfig,
    now: NaiveDateTime,
) -> Result<RunSummary, RunError> {
    let source_date = plan_next(store, config, now.date())?;

    let source_keys = source_keys_for_date(
        store,
        &config.source.container,
        source_date,
        &config.date_format,
    )?;
    if source_keys.is_empty() {
        warn!(%source_date, container = %config.source.container, "no source objects for date");
        return Err(DataError::NotFound {
            container: config.source.container.clone(),
            key: format!("{}/", source_date.format(&config.date_format)),
        }
        .into());
    }

    let target_key = report_key(&config.target, now);
    let outcome = run_daily_report(
        store,
        &config.source.container,
        &config.target.container,
        &source_keys,
        &target_key,
        &config.columns,
        &config.date_format,
        config.reference_date,
    )?;

    let ledger_updated = update_ledger(
        store,
        &config.target.container,
        &config.ledger.key,
        source_date,
        now,
        &config.date_format,
    )?;

    info!(
        %source_date,
        objects = source_keys.len(),
        rows = outcome.aggregate_rows,
        key = %target_key,
        "daily report complete"
    );

    Ok(RunSummary {
        source_date,
        source_objects: source_keys.len(),
        raw_rows: outcome.raw_rows,
        aggregate_rows: outcome.aggregate_rows,
        target_key,
        report_hash: outcome.report_hash,
        ledger_updated,
    })
}
