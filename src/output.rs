//! Output formatting and persistence for comparison results.
//!
//! Supports pretty-printing, JSON files, and CSV append of completeness rows.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::ComparisonReport;
use crate::stats::DatasetStats;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs dataset statistics using Rust's debug pretty-print format.
pub fn print_pretty(stats: &DatasetStats) {
    debug!("{:#?}", stats);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a value as pretty JSON to `path`, replacing any existing file.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, body)?;
    debug!(path, "Wrote JSON output");
    Ok(())
}

/// Appends one [`DatasetStats`] row per configuration of the report to a
/// CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records(path: &str, report: &ComparisonReport) -> Result<()> {
    for stats in &report.completeness {
        append_record(path, stats)?;
    }
    Ok(())
}

/// Appends a [`DatasetStats`] record as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, stats: &DatasetStats) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(stats)?;
    writer.flush()?;

    Ok(())
}
