//! Settings for a comparison run.
//!
//! Defaults can come from a JSON file or from the environment (a `.env`
//! file is loaded by the binary); command-line flags override both.
//!
//! ```json
//! {
//!   "operator_locator": "FN42",
//!   "reporter_field": "reception",
//!   "histogram_bins": 12,
//!   "decode_concurrency": 4
//! }
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analyzers::histogram::MAX_BINS;
use crate::normalize::locator::Locator;
use crate::record::ReporterField;

pub const DEFAULT_HISTOGRAM_BINS: usize = 10;
pub const DEFAULT_DECODE_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareSettings {
    /// The operator's own grid square, used to derive distances.
    pub operator_locator: Option<String>,
    pub reporter_field: ReporterField,
    pub histogram_bins: usize,
    /// Maximum number of files decoded at once.
    pub decode_concurrency: usize,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            operator_locator: None,
            reporter_field: ReporterField::default(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            decode_concurrency: DEFAULT_DECODE_CONCURRENCY,
        }
    }
}

impl CompareSettings {
    /// Loads settings from a JSON file at `path`; missing keys take defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: CompareSettings = serde_json::from_str(&content)?;
        Ok(settings.clamped())
    }

    /// Reads `OPERATOR_LOCATOR`, `REPORTER_FIELD`, `HISTOGRAM_BINS` and
    /// `DECODE_CONCURRENCY` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup. Unparsable values keep their
    /// default and are logged.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(locator) = lookup("OPERATOR_LOCATOR").filter(|l| !l.trim().is_empty()) {
            settings.operator_locator = Some(locator.trim().to_string());
        }

        if let Some(value) = lookup("REPORTER_FIELD") {
            match value.parse::<ReporterField>() {
                Ok(field) => settings.reporter_field = field,
                Err(e) => warn!(error = %e, "Ignoring REPORTER_FIELD"),
            }
        }

        if let Some(value) = lookup("HISTOGRAM_BINS") {
            match value.trim().parse::<usize>() {
                Ok(bins) => settings.histogram_bins = bins,
                Err(e) => warn!(value = %value, error = %e, "Ignoring HISTOGRAM_BINS"),
            }
        }

        if let Some(value) = lookup("DECODE_CONCURRENCY") {
            match value.trim().parse::<usize>() {
                Ok(n) => settings.decode_concurrency = n,
                Err(e) => warn!(value = %value, error = %e, "Ignoring DECODE_CONCURRENCY"),
            }
        }

        settings.clamped()
    }

    /// Parses the operator locator. An invalid locator is logged once and
    /// treated as absent, which leaves derived distances unavailable.
    pub fn operator(&self) -> Option<Locator> {
        let text = self.operator_locator.as_deref()?;
        let locator = Locator::parse(text);
        if locator.is_none() {
            warn!(
                locator = text,
                "Operator locator is not a valid Maidenhead locator; distances will not be derived"
            );
        }
        locator
    }

    fn clamped(mut self) -> Self {
        self.histogram_bins = self.histogram_bins.clamp(1, MAX_BINS);
        self.decode_concurrency = self.decode_concurrency.max(1);
        self
    }
}
