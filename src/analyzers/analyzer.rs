use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::report::build_report;
use crate::analyzers::types::{ComparisonReport, ConfigurationSource};
use crate::normalize::NormalizedRecord;
use crate::normalize::locator::Locator;

/// Aggregates normalized records and builds the comparison report.
///
/// Pure: no I/O and no mutation of the input, so the same records always
/// produce the same report.
#[tracing::instrument(skip_all, fields(configurations = configurations.len(), records = records.len()))]
pub fn analyze(
    configurations: &[ConfigurationSource],
    records: &[NormalizedRecord],
    operator: Option<&Locator>,
    histogram_bins: usize,
) -> ComparisonReport {
    let buckets = aggregate(records);
    let report = build_report(configurations, records, buckets, operator, histogram_bins);

    info!(bands = report.bands.len(), "Comparison report built");
    report
}
