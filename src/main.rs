//! Rainfall Monitoring Service - command line entry point
//!
//! Reads raw rainfall readings (from a local EA export or straight from the
//! Environment Agency API), corrects sensor outliers, and writes one JSON
//! document per station for the read-only endpoints to serve.
//!
//! Usage:
//!   rainmon_service correct --station E7050 --input readings.csv
//!   rainmon_service fetch --station E7050 --station 0890TH --hours 48
//!   rainmon_service show --station E7050
//!
//! Environment:
//!   RAINMON_CONFIG - path to rainmon.toml (default: ./rainmon.toml)
//!   RUST_LOG       - log filter (default: info)

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use rainmon_service::config::{self, ServiceConfig};
use rainmon_service::ingest::ea;
use rainmon_service::model::Reading;
use rainmon_service::pipeline::{self, StationJob};
use rainmon_service::store::FileStore;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (overrides RAINMON_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Correct a local CSV or JSON export and store it
    Correct {
        #[arg(long)]
        station: String,

        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value = "ea")]
        source: String,
    },

    /// Fetch recent readings from the Environment Agency API and store them
    Fetch {
        #[arg(long = "station", required = true)]
        stations: Vec<String>,

        /// Overrides lookback_hours from the configuration
        #[arg(long)]
        hours: Option<i64>,
    },

    /// Print the stored correction summary for a station
    Show {
        #[arg(long)]
        station: String,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = Cli::parse();
    let cfg =
        config::load_config(args.config.as_deref()).context("failed to load configuration")?;
    log::debug!("{cfg:#?}");

    let store = FileStore::open(&cfg.data_dir)
        .with_context(|| format!("failed to open data directory {}", cfg.data_dir.display()))?;

    match args.command {
        Command::Correct {
            station,
            input,
            source,
        } => correct(&cfg, &store, &station, &input, &source),
        Command::Fetch { stations, hours } => fetch(&cfg, &store, stations, hours),
        Command::Show { station } => show(&store, &station),
    }
}

fn read_export(input: &Path) -> Result<Vec<Reading>> {
    let contents =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;

    match input.extension().and_then(|e| e.to_str()) {
        Some("csv") => Ok(ea::parse_readings_csv(&contents)),
        Some("json") => ea::parse_readings_json(&contents)
            .with_context(|| format!("failed to parse {}", input.display())),
        _ => bail!("{}: expected a .csv or .json file", input.display()),
    }
}

fn correct(
    cfg: &ServiceConfig,
    store: &FileStore,
    station: &str,
    input: &Path,
    source: &str,
) -> Result<()> {
    let readings = read_export(input)?;
    log::info!("[{}] parsed {} readings from {}", station, readings.len(), input.display());

    let processed = pipeline::process_station(station, source, &readings, &cfg.outliers)?;
    let path = store.save(&processed.record)?;
    log::info!("[{}] saved {}", station, path.display());
    Ok(())
}

fn fetch(
    cfg: &ServiceConfig,
    store: &FileStore,
    stations: Vec<String>,
    hours: Option<i64>,
) -> Result<()> {
    let hours = hours.unwrap_or(cfg.lookback_hours);
    let Some(since) = config::lookback_start(Utc::now(), hours) else {
        bail!("lookback of {} hours is out of range", hours);
    };
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build HTTP client")?;

    let mut jobs = Vec::new();
    let mut failed = 0;
    for station in stations {
        match ea::fetch_readings(&client, &cfg.ea_base_url, &station, since) {
            Ok(readings) => {
                log::info!("[{}] fetched {} readings", station, readings.len());
                jobs.push(StationJob {
                    station_id: station,
                    source: "ea".to_string(),
                    readings,
                });
            }
            Err(e) => {
                log::warn!("[{}] fetch failed: {}", station, e);
                failed += 1;
            }
        }
    }

    let outcome = pipeline::process_batch(jobs, &cfg.outliers, cfg.workers)?;
    failed += outcome.unfinished.len();

    let mut stored = 0;
    for station in outcome.processed {
        match store.save(&station.record) {
            Ok(_) => stored += 1,
            Err(e) => {
                log::warn!("[{}] save failed: {}", station.record.station_id, e);
                failed += 1;
            }
        }
    }

    log::info!("fetch complete: {} stored, {} failed", stored, failed);
    if stored == 0 && failed > 0 {
        bail!("no stations could be stored");
    }
    Ok(())
}

fn show(store: &FileStore, station: &str) -> Result<()> {
    let Some(record) = store.load(station)? else {
        bail!("no stored document for station {}", station);
    };

    println!("{} ({}), updated {}", record.station_id, record.source, record.updated_at);
    println!(
        "  readings: {} ({} corrected)",
        record.readings.len(),
        record.corrected_readings()
    );
    match &record.correction {
        Some(meta) => {
            println!("  threshold: {} mm", meta.threshold_mm);
            println!("  outliers found: {}", meta.outliers_found);
            println!("  corrections applied: {}", meta.corrections_applied);
            println!("  malformed readings: {}", meta.record_errors);
            for (method, count) in &meta.methods_used {
                println!("    {}: {}", method, count);
            }
        }
        None => println!("  no correction metadata"),
    }
    Ok(())
}
