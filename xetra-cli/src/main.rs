//! Xetra CLI: daily report runs and ledger inspection.
//!
//! Commands:
//! - `run`: process the next unprocessed source date and record it
//! - `plan`: print the next source date without touching anything
//! - `ledger init`: write an empty ledger if none exists
//! - `ledger show`: list processed source dates
//! - `report show`: print the rows of a written report

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xetra_core::ledger::PROCESSED_AT_FORMAT;
use xetra_core::{init_ledger, Ledger, LocalObjectStore};
use xetra_runner::{plan_next, read_report, run_pipeline, ReportConfig, RunSummary};

#[derive(Parser)]
#[command(name = "xetra", about = "Xetra daily report ETL")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the earliest unprocessed source date into a Parquet report.
    Run {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Last eligible source date (YYYY-MM-DD). Overrides `today` in the config.
        #[arg(long)]
        today: Option<String>,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the next source date a run would process.
    Plan {
        /// Path to the TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Last eligible source date (YYYY-MM-DD). Overrides `today` in the config.
        #[arg(long)]
        today: Option<String>,
    },
    /// Ledger management commands.
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },
    /// Report inspection commands.
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[derive(Subcommand)]
enum LedgerAction {
    /// Write an empty ledger if none exists.
    Init {
        #[arg(long)]
        config: PathBuf,
    },
    /// List ledger entries.
    Show {
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    /// Print the rows of a written report.
    Show {
        #[arg(long)]
        config: PathBuf,

        /// Report key inside the target container.
        #[arg(long)]
        key: String,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            today,
            json,
        } => run_cmd(&config, today.as_deref(), json),
        Commands::Plan { config, today } => plan_cmd(&config, today.as_deref()),
        Commands::Ledger { action } => match action {
            LedgerAction::Init { config } => ledger_init_cmd(&config),
            LedgerAction::Show { config } => ledger_show_cmd(&config),
        },
        Commands::Report { action } => match action {
            ReportAction::Show { config, key } => report_show_cmd(&config, &key),
        },
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path, today: Option<&str>) -> Result<ReportConfig> {
    let mut config = ReportConfig::from_file(path)
        .with_context(|| format!("loading config {}", path.display()))?;

    if let Some(today) = today {
        config.today = Some(
            NaiveDate::parse_from_str(today, "%Y-%m-%d")
                .with_context(|| format!("--today '{today}' is not YYYY-MM-DD"))?,
        );
        config.validate()?;
    }
    debug!(store = %config.store.root.display(), "config loaded");
    Ok(config)
}

fn open_store(config: &ReportConfig) -> LocalObjectStore {
    LocalObjectStore::new(config.store.root.clone())
}

fn run_cmd(config_path: &Path, today: Option<&str>, json: bool) -> Result<()> {
    let config = load_config(config_path, today)?;
    let store = open_store(&config);
    let now = chrono::Local::now().naive_local();

    let summary = run_pipeline(&store, &config, now).context("daily report run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("=== Daily Report ===");
    println!("Source date:     {}", summary.source_date);
    println!("Source objects:  {}", summary.source_objects);
    println!("Raw rows:        {}", summary.raw_rows);
    println!("Report rows:     {}", summary.aggregate_rows);
    println!("Report key:      {}", summary.target_key);
    println!("BLAKE3:          {}", summary.report_hash);
    if !summary.ledger_updated {
        println!("Ledger already contained {}", summary.source_date);
    }
}

fn plan_cmd(config_path: &Path, today: Option<&str>) -> Result<()> {
    let config = load_config(config_path, today)?;
    let store = open_store(&config);
    let local_today = chrono::Local::now().date_naive();

    let date = plan_next(&store, &config, local_today).context("planning failed")?;
    println!("{}", date.format(&config.date_format));
    Ok(())
}

fn ledger_init_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path, None)?;
    let store = open_store(&config);

    let created = init_ledger(
        &store,
        &config.target.container,
        &config.ledger.key,
        &config.date_format,
    )?;
    if created {
        println!("Created {}/{}", config.target.container, config.ledger.key);
    } else {
        println!(
            "Ledger {}/{} already exists",
            config.target.container, config.ledger.key
        );
    }
    Ok(())
}

fn ledger_show_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path, None)?;
    let store = open_store(&config);

    let ledger = Ledger::read(
        &store,
        &config.target.container,
        &config.ledger.key,
        &config.date_format,
    )
    .context("reading ledger (run `xetra ledger init` to create one)")?;

    if ledger.is_empty() {
        println!("Ledger is empty.");
        return Ok(());
    }

    println!("{:<12} {:<20}", "source_date", "datetime_of_processing");
    println!("{}", "-".repeat(33));
    for entry in ledger.entries() {
        println!(
            "{:<12} {:<20}",
            entry.source_date.format(&config.date_format).to_string(),
            entry.datetime_of_processing.format(PROCESSED_AT_FORMAT).to_string()
        );
    }
    println!("\n{} processed date(s)", ledger.entries().len());
    Ok(())
}

fn report_show_cmd(config_path: &Path, key: &str) -> Result<()> {
    let config = load_config(config_path, None)?;
    let store = open_store(&config);

    let rows = read_report(&store, &config.target.container, key)
        .with_context(|| format!("reading report {key}"))?;

    println!(
        "{:<14} {:<10} {:>10} {:>10} {:>10} {:>10} {:>14} {:>10}",
        "ISIN", "Date", "open", "close", "min", "max", "volume", "prev_close"
    );
    println!("{}", "-".repeat(95));
    for row in &rows {
        let prev = row
            .prev_closing_price
            .map(|p| format!("{p:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<10} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>14.2} {:>10}",
            row.isin,
            row.date,
            row.opening_price_eur,
            row.closing_price_eur,
            row.minimum_price_eur,
            row.maximum_price_eur,
            row.daily_traded_volume,
            prev
        );
    }
    println!("\n{} row(s)", rows.len());
    Ok(())
}
