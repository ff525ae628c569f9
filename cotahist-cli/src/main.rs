//! cotahist CLI: mirror the exchange's historical series and convert them to Parquet.
//!
//! Commands:
//! - `series`: download missing archives, then remove superseded ones
//! - `parquets`: convert archives that have no Parquet counterpart yet
//! - `all`: `series` followed by `parquets`
//! - `plan`: print what `series` would download, without downloading
//! - `status`: list stored artifacts grouped by granularity

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cotahist_core::naming::{classify, is_source_archive, Granularity};
use cotahist_core::source::B3HttpSource;
use cotahist_core::storage::{open_store, BlobStore, StorageBackend};
use cotahist_runner::{
    dry_run, sync_all, sync_parquets, sync_series, BatchReport, SyncConfig, TracingProgress,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "cotahist",
    about = "Mirror B3 COTAHIST historical series and convert them to Parquet"
)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true, env = "COTAHIST_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend: local or object-store.
    #[arg(long, global = true)]
    storage_backend: Option<StorageBackend>,

    /// Directory (local) or bucket[/prefix] (object-store).
    #[arg(long, global = true)]
    storage_root: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download missing archives within the download budget, then clean up.
    Series,
    /// Convert stored archives to Parquet within the conversion budget.
    Parquets,
    /// Run `series` and then `parquets`.
    All,
    /// Show the download plan without fetching anything.
    Plan {
        /// Print the plan as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stored artifacts grouped by granularity.
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.log_level);

    let today = chrono::Local::now().date_naive();
    let store = open_store(config.storage_backend, &config.storage_root).with_context(|| {
        format!(
            "open {} store at '{}'",
            config.storage_backend, config.storage_root
        )
    })?;
    info!(
        backend = %config.storage_backend,
        root = %config.storage_root,
        "storage ready"
    );

    match cli.command {
        Commands::Series => run_series(&config, store.as_ref(), today),
        Commands::Parquets => run_parquets(&config, store.as_ref()),
        Commands::All => run_all(&config, store.as_ref(), today),
        Commands::Plan { json } => run_plan(&config, store.as_ref(), today, json),
        Commands::Status => run_status(store.as_ref()),
    }
}

fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };
    if let Some(backend) = cli.storage_backend {
        config.storage_backend = backend;
    }
    if let Some(root) = &cli.storage_root {
        config.storage_root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn http_source(config: &SyncConfig) -> Result<B3HttpSource> {
    Ok(B3HttpSource::new(&config.catalog_url, &config.download_base_url)?)
}

fn run_series(config: &SyncConfig, store: &dyn BlobStore, today: NaiveDate) -> Result<()> {
    let source = http_source(config)?;
    let report = sync_series(config, &source, store, today, &TracingProgress)?;

    println!(
        "Downloaded {} series. Missing {} series.",
        report.download.completed.len(),
        report.download.remaining.len()
    );
    if !report.removed.is_empty() {
        println!("Removed {} superseded file(s).", report.removed.len());
    }
    exit_on_failures(&[&report.download]);
    Ok(())
}

fn run_parquets(config: &SyncConfig, store: &dyn BlobStore) -> Result<()> {
    let report = sync_parquets(config, store, &TracingProgress)?;
    print_conversions(&report);
    exit_on_failures(&[&report]);
    Ok(())
}

fn run_all(config: &SyncConfig, store: &dyn BlobStore, today: NaiveDate) -> Result<()> {
    let source = http_source(config)?;
    let report = sync_all(config, &source, store, today, &TracingProgress)?;

    println!(
        "Downloaded {} series. Missing {} series.",
        report.series.download.completed.len(),
        report.series.download.remaining.len()
    );
    print_conversions(&report.parquets);
    exit_on_failures(&[&report.series.download, &report.parquets]);
    Ok(())
}

fn run_plan(config: &SyncConfig, store: &dyn BlobStore, today: NaiveDate, json: bool) -> Result<()> {
    let source = http_source(config)?;
    let planned = dry_run(&source, store, today)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    if planned.is_empty() {
        println!("Nothing to download.");
        return Ok(());
    }
    for item in &planned {
        println!(
            "{:<8} {:<12} {}",
            item.granularity.to_string(),
            item.label,
            item.file_name
        );
    }
    println!("\n{} file(s) to download.", planned.len());
    Ok(())
}

fn run_status(store: &dyn BlobStore) -> Result<()> {
    let names = store.list().context("list store")?;
    if names.is_empty() {
        println!("Store is empty: {}", store.location(""));
        return Ok(());
    }

    let mut groups: BTreeMap<Option<Granularity>, (usize, usize)> = BTreeMap::new();
    for name in &names {
        let granularity = classify(name).map(|a| a.granularity());
        let (archives, converted) = groups.entry(granularity).or_default();
        if is_source_archive(name) {
            *archives += 1;
        } else {
            *converted += 1;
        }
    }

    println!("Store: {}", store.location(""));
    println!("{:<8} {:>8} {:>9}", "", "archives", "converted");
    for (granularity, (archives, converted)) in &groups {
        let label = granularity.map_or_else(|| "unknown".to_string(), |g| g.to_string());
        println!("{label:<8} {archives:>8} {converted:>9}");
    }
    println!("\nTotal: {} file(s)", names.len());
    Ok(())
}

fn print_conversions(report: &BatchReport) {
    println!(
        "Converted {} parquets. {} remaining.",
        report.completed.len(),
        report.remaining.len()
    );
}

fn exit_on_failures(reports: &[&BatchReport]) {
    let mut failed = false;
    for report in reports {
        for failure in &report.failures {
            eprintln!("Error for {}: {}", failure.name, failure.error);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}
