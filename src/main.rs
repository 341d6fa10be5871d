//! CLI entry point for the antenna comparison tool.
//!
//! Provides subcommands for comparing antenna configurations from one ADIF
//! export each, and for inspecting the data completeness of a single file.

use anyhow::{Result, bail};
use antenna_compare::binder::{Upload, bind_upload};
use antenna_compare::analyzers::histogram::MAX_BINS;
use antenna_compare::config::CompareSettings;
use antenna_compare::normalize::normalize;
use antenna_compare::output::{append_records, print_json, print_pretty, write_json};
use antenna_compare::parser::parse_adif;
use antenna_compare::pipeline::compare;
use antenna_compare::record::{ConfigurationId, ReporterField};
use antenna_compare::stats::DatasetStats;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "antenna_compare")]
#[command(about = "Compare antenna configurations from ADIF reception reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare antenna configurations, one ADIF file per configuration
    Compare {
        /// Configuration binding as ID=PATH (e.g. 0=dipole.adi); repeat per file
        #[arg(short, long = "file", value_name = "ID=PATH", required = true, value_parser = parse_binding)]
        files: Vec<(u8, String)>,

        /// Operator grid locator used to derive distances (e.g. FN42)
        #[arg(short, long)]
        locator: Option<String>,

        /// Which station field names the reporter: reception (CALL) or transmission (OPERATOR)
        #[arg(short, long)]
        mode: Option<ReporterField>,

        /// Number of histogram bins per metric
        #[arg(long)]
        bins: Option<usize>,

        /// Maximum number of files decoded at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Optional: JSON settings file providing defaults
        #[arg(long)]
        config: Option<String>,

        /// JSON file to write the report to (logged when omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Optional: CSV file to append per-configuration completeness rows to
        #[arg(long)]
        stats_csv: Option<String>,
    },
    /// Decode a single ADIF file and report its data completeness
    Inspect {
        /// Path to the ADIF file
        #[arg(value_name = "FILE")]
        source: String,

        /// Operator grid locator used to derive distances
        #[arg(short, long)]
        locator: Option<String>,

        /// Which station field names the reporter
        #[arg(short, long)]
        mode: Option<ReporterField>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/antenna_compare.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("antenna_compare.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            files,
            locator,
            mode,
            bins,
            concurrency,
            config,
            output,
            stats_csv,
        } => {
            let mut settings = match config {
                Some(path) => CompareSettings::load(&path)?,
                None => CompareSettings::from_env(),
            };
            if locator.is_some() {
                settings.operator_locator = locator;
            }
            if let Some(mode) = mode {
                settings.reporter_field = mode;
            }
            if let Some(bins) = bins {
                settings.histogram_bins = bins.clamp(1, MAX_BINS);
            }
            if let Some(concurrency) = concurrency {
                settings.decode_concurrency = concurrency.max(1);
            }

            let uploads = read_uploads(&files)?;
            let report = compare(uploads, &settings).await?;

            for band in &report.bands {
                let Some(leader) = band.rankings.first() else {
                    continue;
                };
                info!(
                    band = %band.band,
                    leader = %leader.configuration_id,
                    mean_strength_db = leader.mean_strength_db(),
                    reports = band.total_records,
                    configurations = band.rankings.len(),
                    "Band leader"
                );
            }

            if let Some(overall) = report.overall.first() {
                info!(
                    leader = %overall.configuration_id,
                    mean_strength_db = overall.mean_strength_db,
                    "Overall leader"
                );
            }

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path, "Report written");
                }
                None => print_json(&report)?,
            }

            if let Some(path) = stats_csv {
                append_records(&path, &report)?;
            }
        }
        Commands::Inspect {
            source,
            locator,
            mode,
        } => {
            let mut settings = CompareSettings::from_env();
            if locator.is_some() {
                settings.operator_locator = locator;
            }
            if let Some(mode) = mode {
                settings.reporter_field = mode;
            }

            let bytes = std::fs::read(&source)?;
            let header = parse_adif(&bytes)?.header();
            for (field, value) in header.iter() {
                debug!(field, value, "ADIF header field");
            }

            let upload = Upload::new(0, &source, bytes);
            let id = ConfigurationId::try_from(0u8)?;
            let dataset = bind_upload(&upload, id, settings.reporter_field)?;
            let operator = settings.operator();
            let records = normalize(&dataset.records, operator.as_ref());
            let stats = DatasetStats::from_records(id, &records).with_file_name(&source);

            if stats.total_records == 0 {
                warn!(file = %source, "File contains no records");
            } else {
                info!(
                    file = %source,
                    records = stats.total_records,
                    strength_pct = stats.strength_coverage_pct,
                    distance_pct = stats.distance_pct(),
                    grade = stats.completeness_grade.as_str(),
                    "Data completeness"
                );
            }

            print_pretty(&stats);
            print_json(&stats)?;
        }
    }

    Ok(())
}

/// Reads every bound file into memory.
fn read_uploads(files: &[(u8, String)]) -> Result<Vec<Upload>> {
    files
        .iter()
        .map(|(id, path)| {
            let content = std::fs::read(path)?;
            let name = Path::new(path)
                .file_name()
                .and_then(OsStr::to_str)
                .unwrap_or(path);
            Ok(Upload::new(*id, name, content))
        })
        .collect()
}

/// Parses an `ID=PATH` binding.
fn parse_binding(s: &str) -> Result<(u8, String)> {
    let Some((id, path)) = s.split_once('=') else {
        bail!("expected ID=PATH, got '{s}'");
    };
    let id: u8 = id.trim().parse()?;
    if path.trim().is_empty() {
        bail!("missing path for configuration {id}");
    }
    Ok((id, path.trim().to_string()))
}
