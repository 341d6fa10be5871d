//! Data types produced by the aggregation engine and report builder.

use serde::Serialize;

use crate::normalize::band::Band;
use crate::record::ConfigurationId;
use crate::stats::DatasetStats;

/// Signal strength summary for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthStats {
    pub mean_db: f64,
    pub median_db: f64,
    pub best_db: f64,
    pub worst_db: f64,
}

/// Distance summary for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceStats {
    pub mean_km: f64,
    pub max_km: f64,
}

/// Statistics for one configuration on one band.
///
/// `strength` and `distance` are `None` when no record in the bucket carries
/// the metric; a strength of 0 dB is a real value and never means absence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateBucket {
    pub configuration_id: ConfigurationId,
    pub band: Band,
    /// 1-based position among the configurations heard on this band.
    pub rank: usize,
    pub report_count: usize,
    pub strength_count: usize,
    pub distance_count: usize,
    pub strength: Option<StrengthStats>,
    pub distance: Option<DistanceStats>,
}

impl AggregateBucket {
    pub fn mean_strength_db(&self) -> Option<f64> {
        self.strength.as_ref().map(|s| s.mean_db)
    }
}

/// Evenly spaced bin edges shared by every histogram of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramEdges {
    pub min: f64,
    pub max: f64,
    pub width: f64,
    /// `bins + 1` boundaries from `min` to `max`.
    pub edges: Vec<f64>,
}

/// Bin counts for one configuration on one band. Records lacking the metric
/// are counted in `unavailable`, so `counts` plus `unavailable` always add
/// up to the bucket's report count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Histogram {
    pub counts: Vec<usize>,
    pub unavailable: usize,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationHistograms {
    pub configuration_id: ConfigurationId,
    pub strength: Histogram,
    pub distance: Histogram,
}

/// How one configuration fared with the reporters it shares with others.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadToHeadEntry {
    pub configuration_id: ConfigurationId,
    pub reporters_reached: usize,
    pub strength_reports: usize,
    pub mean_strength_db: Option<f64>,
}

/// Comparison restricted to reporters that heard two or more configurations
/// on the same band.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadToHead {
    pub common_reporters: usize,
    pub entries: Vec<HeadToHeadEntry>,
}

/// Everything the rendering layer needs for one band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandComparison {
    pub band: Band,
    pub total_records: usize,
    pub rankings: Vec<AggregateBucket>,
    pub histograms: Vec<ConfigurationHistograms>,
    pub head_to_head: HeadToHead,
}

/// Cross-band summary of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationSummary {
    pub configuration_id: ConfigurationId,
    pub rank: usize,
    pub report_count: usize,
    pub bands_heard: usize,
    pub strength_count: usize,
    pub mean_strength_db: Option<f64>,
    pub strength_stddev_db: Option<f64>,
    pub mean_distance_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub distance_km: f64,
    pub strength_db: f64,
}

/// Distance against strength for every record carrying both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub configuration_id: ConfigurationId,
    pub points: Vec<ScatterPoint>,
}

/// Complete result of one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub operator_locator: Option<String>,
    pub histogram_bins: usize,
    pub strength_edges: Option<HistogramEdges>,
    pub distance_edges: Option<HistogramEdges>,
    pub bands: Vec<BandComparison>,
    pub overall: Vec<ConfigurationSummary>,
    pub completeness: Vec<DatasetStats>,
    pub scatter: Vec<ScatterSeries>,
}

impl ComparisonReport {
    /// Looks up the comparison for `band`, if any record landed on it.
    pub fn band(&self, band: Band) -> Option<&BandComparison> {
        self.bands.iter().find(|b| b.band == band)
    }
}

/// A configuration taking part in a run and the file it came from. Listed
/// separately from the records so that a file with no records still shows
/// up in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationSource {
    pub configuration_id: ConfigurationId,
    pub file_name: String,
}
