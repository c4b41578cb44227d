//! CLI for the cirrus weather statistics engine.
//!
//! Provides commands for loading observations, inspecting statistics and
//! running the realtime publishing loop.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cirrus::realtime::marshal;
use cirrus::{
    Config, ObservationStore, ObservationView, OnBadLine, RealtimeService, StatisticsGenerator,
    Store, ingest_lines,
};

/// cirrus: weather station statistics and realtime record CLI.
#[derive(Parser)]
#[command(name = "cirrus", version, about)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory, overriding `database_path` from the config.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Insert observations from a file of JSON lines.
    Ingest {
        /// File with one JSON observation per line.
        path: PathBuf,
    },

    /// Print the latest observation as JSON.
    Last {
        /// Instant to look back from, RFC 3339. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the statistics snapshot as JSON.
    Stats {
        /// Instant to generate for, RFC 3339. Defaults to now. Trailing
        /// windows end before this instant, so a reading stamped exactly
        /// at it only counts toward the current values.
        #[arg(long)]
        at: Option<String>,
    },

    /// Print or write the realtime record.
    Realtime {
        /// Instant to generate for, RFC 3339. Defaults to now. Trailing
        /// windows end before this instant, so a reading stamped exactly
        /// at it only counts toward the current values.
        #[arg(long)]
        at: Option<String>,

        /// Write the record to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Publish the realtime record on the configured schedule until killed.
    ///
    /// JSON observation lines written to stdin are inserted as they
    /// arrive, so a station feed can be piped straight in. This process
    /// owns the store while it runs.
    Watch,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref(), cli.store).and_then(|config| {
        match cli.command {
            Commands::Ingest { path } => cmd_ingest(&config, &path),
            Commands::Last { at } => cmd_last(&config, at.as_deref()),
            Commands::Stats { at } => cmd_stats(&config, at.as_deref()),
            Commands::Realtime { at, output } => {
                cmd_realtime(&config, at.as_deref(), output.as_deref())
            }
            Commands::Watch => cmd_watch(&config),
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Loads the config file if one was given and applies overrides.
fn load_config(
    path: Option<&Path>,
    store: Option<PathBuf>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(store) = store {
        config.database_path = store;
    }
    Ok(config)
}

/// Parses `--at`, defaulting to the current local time.
fn parse_at(at: Option<&str>) -> Result<DateTime<FixedOffset>, Box<dyn std::error::Error>> {
    match at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map_err(|e| format!("Invalid --at '{s}': {e}").into()),
        None => Ok(Local::now().fixed_offset()),
    }
}

fn open_generator(
    config: &Config,
) -> Result<StatisticsGenerator<Store>, Box<dyn std::error::Error>> {
    let store = Store::open(&config.database_path)?;
    Ok(StatisticsGenerator::new(store, config.generator_config()))
}

/// Implements `cirrus ingest <path>`.
fn cmd_ingest(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open(&config.database_path)?;
    let reader = BufReader::new(std::fs::File::open(path)?);

    let summary = ingest_lines(&store, reader, OnBadLine::Abort)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    println!(
        "Ingested {} observations into {}",
        summary.inserted,
        config.database_path.display()
    );
    Ok(())
}

/// Implements `cirrus last`.
fn cmd_last(config: &Config, at: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let at = parse_at(at)?.with_timezone(&Utc);
    let store = Store::open(&config.database_path)?;
    let view = store.view()?;

    match view.last_at_or_before(at)? {
        Some(observation) => println!("{}", serde_json::to_string_pretty(&observation)?),
        None => return Err(format!("No observation at or before {at}").into()),
    }
    Ok(())
}

/// Implements `cirrus stats`.
fn cmd_stats(config: &Config, at: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let at = parse_at(at)?;
    let stats = open_generator(config)?.generate(&at)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

/// Implements `cirrus realtime`.
fn cmd_realtime(
    config: &Config,
    at: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let at = parse_at(at)?;
    let record = marshal(&open_generator(config)?.generate(&at)?);

    match output {
        Some(path) => {
            std::fs::write(path, &record)?;
            println!("Wrote {} bytes to {}", record.len(), path.display());
        }
        None => println!("{}", String::from_utf8_lossy(&record)),
    }
    Ok(())
}

/// Implements `cirrus watch`.
fn cmd_watch(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(Store::open(&config.database_path)?);

    let feed = Arc::clone(&store);
    std::thread::Builder::new()
        .name("cirrus-stdin".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            match ingest_lines(&*feed, stdin.lock(), OnBadLine::Skip) {
                Ok(summary) => tracing::info!(
                    inserted = summary.inserted,
                    skipped = summary.skipped,
                    "stdin closed"
                ),
                Err(e) => tracing::error!(error = %e, "stdin ingest stopped"),
            }
        })?;

    let generator = StatisticsGenerator::new(store, config.generator_config());
    let service = RealtimeService::new(generator, config.schedule()?, &config.realtime.output_path);
    tracing::info!(store = %config.database_path.display(), "watching for realtime publishing");

    // The sender is never used; the loop runs until the process is killed.
    let (_stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
    service.run(&stop_rx);
    Ok(())
}
