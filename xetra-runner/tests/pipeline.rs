//! Integration tests for the full daily report pipeline.
//!
//! A run plans the next unprocessed date from the ledger, aggregates that
//! date's source objects into a Parquet report and records the date.

use chrono::{NaiveDate, NaiveDateTime};
use xetra_core::{
    init_ledger, DailyAggregate, DataError, Ledger, LocalObjectStore, MemoryObjectStore,
    ObjectStore,
};
use xetra_runner::{read_report, run_pipeline, plan_next, ReportConfig, RunError};

const HEADER: &str = "ISIN,Date,Time,StartPrice,MaxPrice,MinPrice,EndPrice,TradedVolume";

const CONFIG: &str = r#"
reference_date = "2021-04-22"
today = "2021-04-24"

[source]
container = "xetra"

[target]
container = "reports"
"#;

fn config() -> ReportConfig {
    ReportConfig::from_toml(CONFIG).unwrap()
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 4, d).unwrap()
}

fn now(d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 5, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

fn seed(store: &dyn ObjectStore) {
    let day22_morning = format!(
        "{HEADER}\nDE0001,2021-04-22,09:00,10.0,10.6,9.8,10.5,100\nDE0002,2021-04-22,10:00,5.0,5.0,5.0,5.0,7\n"
    );
    let day22_afternoon = format!("{HEADER}\nDE0001,2021-04-22,15:00,10.4,11.2,10.0,11.0,50\n");
    let day23 = format!("{HEADER}\nDE0001,2021-04-23,09:30,11.1,11.5,11.0,11.4,20\n");

    store
        .put("xetra", "2021-04-22/2021-04-22_BINS_XETR09.csv", day22_morning.as_bytes())
        .unwrap();
    store
        .put("xetra", "2021-04-22/2021-04-22_BINS_XETR15.csv", day22_afternoon.as_bytes())
        .unwrap();
    store
        .put("xetra", "2021-04-23/2021-04-23_BINS_XETR09.csv", day23.as_bytes())
        .unwrap();

    init_ledger(store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
}

#[test]
fn first_run_processes_reference_date() {
    let store = MemoryObjectStore::new();
    seed(&store);

    let summary = run_pipeline(&store, &config(), now(1, 6)).unwrap();

    assert_eq!(summary.source_date, date(22));
    assert_eq!(summary.source_objects, 2);
    assert_eq!(summary.raw_rows, 3);
    assert_eq!(summary.aggregate_rows, 2);
    assert_eq!(summary.target_key, "xetra_daily_report_20210501_060000.parquet");
    assert!(summary.ledger_updated);

    let report = read_report(&store, "reports", &summary.target_key).unwrap();
    assert_eq!(
        report[0],
        DailyAggregate {
            isin: "DE0001".into(),
            date: date(22),
            opening_price_eur: 10.0,
            closing_price_eur: 11.0,
            minimum_price_eur: 9.8,
            maximum_price_eur: 11.2,
            daily_traded_volume: 150.0,
            prev_closing_price: None,
        }
    );
    assert_eq!(report[1].isin, "DE0002");

    let ledger = Ledger::read(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
    assert_eq!(ledger.entries().len(), 1);
    assert_eq!(ledger.entries()[0].source_date, date(22));
    assert_eq!(ledger.entries()[0].datetime_of_processing, now(1, 6));
}

#[test]
fn successive_runs_walk_the_window() {
    let store = MemoryObjectStore::new();
    seed(&store);
    let config = config();

    let first = run_pipeline(&store, &config, now(1, 6)).unwrap();
    let second = run_pipeline(&store, &config, now(1, 7)).unwrap();

    assert_eq!(first.source_date, date(22));
    assert_eq!(second.source_date, date(23));
    assert_eq!(second.aggregate_rows, 1);

    // 2021-04-24 has no source objects yet
    match run_pipeline(&store, &config, now(1, 8)) {
        Err(RunError::Data(DataError::NotFound { container, key })) => {
            assert_eq!(container, "xetra");
            assert_eq!(key, "2021-04-24/");
        }
        other => panic!("expected NotFound, got: {other:?}"),
    }
    let ledger = Ledger::read(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
    assert!(!ledger.contains(date(24)));

    // once the files arrive the date is picked up
    store
        .put(
            "xetra",
            "2021-04-24/2021-04-24_BINS_XETR09.csv",
            format!("{HEADER}\nDE0001,2021-04-24,09:00,11.5,11.6,11.4,11.6,3\n").as_bytes(),
        )
        .unwrap();
    let third = run_pipeline(&store, &config, now(1, 9)).unwrap();
    assert_eq!(third.source_date, date(24));
    assert_eq!(third.aggregate_rows, 1);

    match run_pipeline(&store, &config, now(1, 10)) {
        Err(RunError::Data(DataError::EmptyResult { start, end })) => {
            assert_eq!(start, date(22));
            assert_eq!(end, date(24));
        }
        other => panic!("expected EmptyResult, got: {other:?}"),
    }
}

#[test]
fn date_without_source_objects_writes_nothing() {
    let store = MemoryObjectStore::new();
    init_ledger(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();

    let result = run_pipeline(&store, &config(), now(1, 6));

    assert!(matches!(
        result,
        Err(RunError::Data(DataError::NotFound { .. }))
    ));
    let objects: Vec<String> = store
        .list("reports")
        .unwrap()
        .into_iter()
        .map(|o| o.key)
        .collect();
    assert_eq!(objects, ["meta_file.csv"]);
    let ledger = Ledger::read(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn each_run_writes_its_own_report_key() {
    let store = MemoryObjectStore::new();
    seed(&store);
    let config = config();

    let first = run_pipeline(&store, &config, now(1, 6)).unwrap();
    let second = run_pipeline(&store, &config, now(2, 6)).unwrap();

    assert_ne!(first.target_key, second.target_key);
    assert!(store.exists("reports", &first.target_key).unwrap());
    assert!(store.exists("reports", &second.target_key).unwrap());
}

#[test]
fn plan_does_not_mutate_ledger() {
    let store = MemoryObjectStore::new();
    seed(&store);
    let config = config();

    let a = plan_next(&store, &config, date(30)).unwrap();
    let b = plan_next(&store, &config, date(30)).unwrap();
    assert_eq!(a, date(22));
    assert_eq!(a, b);

    let ledger = Ledger::read(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn missing_ledger_aborts_before_any_output() {
    let store = MemoryObjectStore::new();
    store
        .put("xetra", "2021-04-22/a.csv", format!("{HEADER}\n").as_bytes())
        .unwrap();

    let result = run_pipeline(&store, &config(), now(1, 6));

    assert!(matches!(
        result,
        Err(RunError::Data(DataError::NotFound { .. }))
    ));
    assert!(store.list("reports").unwrap().is_empty());
}

#[test]
fn decode_failure_leaves_ledger_untouched() {
    let store = MemoryObjectStore::new();
    seed(&store);
    store
        .put(
            "xetra",
            "2021-04-22/2021-04-22_BINS_XETR20.csv",
            format!("{HEADER}\nDE0001,2021-04-22,20:00,abc,1,1,1,1\n").as_bytes(),
        )
        .unwrap();

    let result = run_pipeline(&store, &config(), now(1, 6));

    assert!(matches!(result, Err(RunError::Data(DataError::Decode { .. }))));
    let ledger = Ledger::read(&store, "reports", "meta_file.csv", "%Y-%m-%d").unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn pipeline_runs_against_filesystem_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path());
    seed(&store);

    let summary = run_pipeline(&store, &config(), now(1, 6)).unwrap();

    let written = dir
        .path()
        .join("reports")
        .join(&summary.target_key);
    assert!(written.is_file());
    assert!(dir.path().join("reports").join("meta_file.csv").is_file());

    let bytes = std::fs::read(&written).unwrap();
    assert_eq!(blake3::hash(&bytes).to_hex().to_string(), summary.report_hash);
}
