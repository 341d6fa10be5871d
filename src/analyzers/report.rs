//! Shapes ranked buckets into the [`ComparisonReport`] handed to renderers.

use std::collections::{BTreeMap, BTreeSet};

use crate::analyzers::aggregate::{Standing, compare_standing};
use crate::analyzers::histogram::{MAX_BINS, unavailable_histogram};
use crate::analyzers::types::{
    AggregateBucket, BandComparison, ComparisonReport, ConfigurationHistograms,
    ConfigurationSource, ConfigurationSummary, HeadToHead, HeadToHeadEntry, Histogram,
    HistogramEdges, ScatterPoint, ScatterSeries,
};
use crate::analyzers::utility::{mean, sorted, stddev};
use crate::normalize::NormalizedRecord;
use crate::normalize::band::Band;
use crate::normalize::locator::Locator;
use crate::record::ConfigurationId;
use crate::stats::DatasetStats;

/// Assembles the report from ranked buckets and the records behind them.
///
/// Histogram edges are computed once per metric over every record in the
/// run so all configurations and bands share the same bins.
pub fn build_report(
    configurations: &[ConfigurationSource],
    records: &[NormalizedRecord],
    buckets: BTreeMap<Band, Vec<AggregateBucket>>,
    operator: Option<&Locator>,
    histogram_bins: usize,
) -> ComparisonReport {
    let histogram_bins = histogram_bins.clamp(1, MAX_BINS);
    let strength_edges = HistogramEdges::from_values(
        records.iter().filter_map(|r| r.signal_strength_db),
        histogram_bins,
    );
    let distance_edges =
        HistogramEdges::from_values(records.iter().filter_map(|r| r.distance_km), histogram_bins);

    let mut by_band: BTreeMap<Band, Vec<&NormalizedRecord>> = BTreeMap::new();
    for record in records {
        by_band.entry(record.band).or_default().push(record);
    }

    let bands = buckets
        .into_iter()
        .filter_map(|(band, rankings)| {
            let band_records = by_band.get(&band)?;
            if band_records.is_empty() {
                return None;
            }

            let histograms = rankings
                .iter()
                .map(|bucket| {
                    let group: Vec<&NormalizedRecord> = band_records
                        .iter()
                        .copied()
                        .filter(|r| r.configuration_id == bucket.configuration_id)
                        .collect();
                    ConfigurationHistograms {
                        configuration_id: bucket.configuration_id,
                        strength: metric_histogram(
                            strength_edges.as_ref(),
                            group.iter().map(|r| r.signal_strength_db),
                        ),
                        distance: metric_histogram(
                            distance_edges.as_ref(),
                            group.iter().map(|r| r.distance_km),
                        ),
                    }
                })
                .collect();

            Some(BandComparison {
                band,
                total_records: band_records.len(),
                head_to_head: head_to_head(band_records),
                rankings,
                histograms,
            })
        })
        .collect();

    let mut ids: Vec<ConfigurationId> = configurations.iter().map(|c| c.configuration_id).collect();
    ids.sort();

    ComparisonReport {
        operator_locator: operator.map(|l| l.grid.clone()),
        histogram_bins,
        strength_edges,
        distance_edges,
        bands,
        overall: overall_summary(&ids, records),
        completeness: completeness(configurations, records),
        scatter: ids
            .iter()
            .map(|id| scatter_series(*id, records))
            .collect(),
    }
}

fn metric_histogram(
    edges: Option<&HistogramEdges>,
    values: impl ExactSizeIterator<Item = Option<f64>>,
) -> Histogram {
    match edges {
        Some(edges) => edges.histogram(values),
        None => unavailable_histogram(values.len()),
    }
}

type ReporterKey = (String, String);

fn reporter_key(r: &NormalizedRecord) -> Option<ReporterKey> {
    let call = r.reporter_callsign.as_ref()?;
    let grid = r
        .reporter_grid
        .as_deref()
        .map(|g| g.trim().to_ascii_uppercase().chars().take(6).collect::<String>())
        .unwrap_or_default();
    Some((call.clone(), grid))
}

/// Compares configurations only over reporters that heard at least two of
/// them on this band. Reporters are keyed by callsign and the first six
/// locator characters; records without a callsign are ignored.
fn head_to_head(band_records: &[&NormalizedRecord]) -> HeadToHead {
    let mut heard_by: BTreeMap<ReporterKey, BTreeSet<ConfigurationId>> = BTreeMap::new();
    for r in band_records {
        if let Some(k) = reporter_key(r) {
            heard_by.entry(k).or_default().insert(r.configuration_id);
        }
    }
    heard_by.retain(|_, configs| configs.len() >= 2);

    if heard_by.is_empty() {
        return HeadToHead::default();
    }

    let present: BTreeSet<ConfigurationId> =
        band_records.iter().map(|r| r.configuration_id).collect();

    let mut entries: Vec<HeadToHeadEntry> = present
        .into_iter()
        .map(|id| {
            let reporters_reached = heard_by.values().filter(|c| c.contains(&id)).count();
            let strengths = sorted(
                band_records
                    .iter()
                    .filter(|r| r.configuration_id == id)
                    .filter(|r| reporter_key(r).is_some_and(|k| heard_by.contains_key(&k)))
                    .filter_map(|r| r.signal_strength_db),
            );
            HeadToHeadEntry {
                configuration_id: id,
                reporters_reached,
                strength_reports: strengths.len(),
                mean_strength_db: mean(&strengths),
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        compare_standing(
            &Standing {
                configuration_id: a.configuration_id,
                mean_strength_db: a.mean_strength_db,
                report_count: a.strength_reports,
            },
            &Standing {
                configuration_id: b.configuration_id,
                mean_strength_db: b.mean_strength_db,
                report_count: b.strength_reports,
            },
        )
    });

    HeadToHead {
        common_reporters: heard_by.len(),
        entries,
    }
}

/// Cross-band summary, ranked with the same rule as each band.
fn overall_summary(ids: &[ConfigurationId], records: &[NormalizedRecord]) -> Vec<ConfigurationSummary> {
    let mut summaries: Vec<ConfigurationSummary> = ids
        .iter()
        .map(|id| {
            let own: Vec<&NormalizedRecord> = records
                .iter()
                .filter(|r| r.configuration_id == *id)
                .collect();
            let strengths = sorted(own.iter().filter_map(|r| r.signal_strength_db));
            let distances = sorted(own.iter().filter_map(|r| r.distance_km));
            let bands: BTreeSet<Band> = own.iter().map(|r| r.band).collect();
            let mean_strength_db = mean(&strengths);

            ConfigurationSummary {
                configuration_id: *id,
                rank: 0,
                report_count: own.len(),
                bands_heard: bands.len(),
                strength_count: strengths.len(),
                mean_strength_db,
                strength_stddev_db: mean_strength_db.map(|m| stddev(&strengths, m)),
                mean_distance_km: mean(&distances),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        compare_standing(
            &Standing {
                configuration_id: a.configuration_id,
                mean_strength_db: a.mean_strength_db,
                report_count: a.report_count,
            },
            &Standing {
                configuration_id: b.configuration_id,
                mean_strength_db: b.mean_strength_db,
                report_count: b.report_count,
            },
        )
    });
    for (i, summary) in summaries.iter_mut().enumerate() {
        summary.rank = i + 1;
    }
    summaries
}

fn completeness(
    configurations: &[ConfigurationSource],
    records: &[NormalizedRecord],
) -> Vec<DatasetStats> {
    let mut rows: Vec<DatasetStats> = configurations
        .iter()
        .map(|c| {
            DatasetStats::from_records(
                c.configuration_id,
                records.iter().filter(|r| r.configuration_id == c.configuration_id),
            )
            .with_file_name(&c.file_name)
        })
        .collect();
    rows.sort_by_key(|s| s.configuration_id);
    rows
}

fn scatter_series(id: ConfigurationId, records: &[NormalizedRecord]) -> ScatterSeries {
    let mut points: Vec<ScatterPoint> = records
        .iter()
        .filter(|r| r.configuration_id == id)
        .filter_map(|r| {
            Some(ScatterPoint {
                distance_km: r.distance_km?,
                strength_db: r.signal_strength_db?,
            })
        })
        .collect();
    points.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.strength_db.total_cmp(&b.strength_db))
    });
    ScatterSeries {
        configuration_id: id,
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;

    fn id(n: u8) -> ConfigurationId {
        ConfigurationId::try_from(n).unwrap()
    }

    fn sources(ids: &[u8]) -> Vec<ConfigurationSource> {
        ids.iter()
            .map(|n| ConfigurationSource {
                configuration_id: id(*n),
                file_name: format!("ant{n}.adi"),
            })
            .collect()
    }

    fn rec(
        config: u8,
        band: Band,
        call: Option<&str>,
        strength: Option<f64>,
        distance: Option<f64>,
    ) -> NormalizedRecord {
        NormalizedRecord {
            configuration_id: id(config),
            reporter_callsign: call.map(str::to_string),
            reporter_grid: None,
            reporter_locator: None,
            band,
            band_explicit: true,
            frequency_hz: None,
            signal_strength_db: strength,
            timestamp_utc: None,
            distance_km: distance,
        }
    }

    fn build(ids: &[u8], records: &[NormalizedRecord]) -> ComparisonReport {
        build_report(&sources(ids), records, aggregate(records), None, 4)
    }

    #[test]
    fn test_bands_in_frequency_order_unknown_last() {
        let records = vec![
            rec(0, Band::Unknown, None, None, None),
            rec(0, Band::M10, None, Some(-1.0), None),
            rec(1, Band::M40, None, Some(-2.0), None),
        ];
        let report = build(&[0, 1], &records);
        let bands: Vec<Band> = report.bands.iter().map(|b| b.band).collect();
        assert_eq!(bands, vec![Band::M40, Band::M10, Band::Unknown]);
    }

    #[test]
    fn test_unknown_band_omitted_when_empty() {
        let records = vec![rec(0, Band::M20, None, Some(-1.0), None)];
        let report = build(&[0, 1], &records);
        assert!(report.band(Band::Unknown).is_none());
        assert_eq!(report.bands.len(), 1);
    }

    #[test]
    fn test_histograms_share_edges_and_reconcile() {
        let records = vec![
            rec(0, Band::M20, None, Some(-20.0), Some(100.0)),
            rec(0, Band::M20, None, Some(0.0), None),
            rec(0, Band::M20, None, None, Some(900.0)),
            rec(1, Band::M40, None, Some(-10.0), None),
            rec(1, Band::M40, None, None, None),
        ];
        let report = build(&[0, 1], &records);

        let strength_edges = report.strength_edges.as_ref().unwrap();
        assert_eq!(strength_edges.min, -20.0);
        assert_eq!(strength_edges.max, 0.0);

        for band in &report.bands {
            for (bucket, hist) in band.rankings.iter().zip(&band.histograms) {
                assert_eq!(bucket.configuration_id, hist.configuration_id);
                assert_eq!(hist.strength.total(), bucket.report_count);
                assert_eq!(hist.distance.total(), bucket.report_count);
                assert_eq!(hist.strength.counts.len(), 4);
            }
        }

        let forty = report.band(Band::M40).unwrap();
        assert_eq!(forty.histograms[0].strength.counts, vec![0, 0, 1, 0]);
        assert_eq!(forty.histograms[0].distance.unavailable, 2);
    }

    #[test]
    fn test_no_values_gives_unavailable_histograms() {
        let records = vec![
            rec(0, Band::M20, None, None, None),
            rec(1, Band::M20, None, None, None),
        ];
        let report = build(&[0, 1], &records);
        assert!(report.strength_edges.is_none());
        let h = &report.bands[0].histograms[0].strength;
        assert!(h.counts.is_empty());
        assert_eq!(h.unavailable, 1);
    }

    #[test]
    fn test_head_to_head_uses_common_reporters() {
        let records = vec![
            rec(0, Band::M20, Some("W1AW"), Some(-5.0), None),
            rec(1, Band::M20, Some("W1AW"), Some(-9.0), None),
            rec(0, Band::M20, Some("K1ABC"), Some(10.0), None),
            rec(1, Band::M20, None, Some(20.0), None),
        ];
        let report = build(&[0, 1], &records);
        let h2h = &report.band(Band::M20).unwrap().head_to_head;

        assert_eq!(h2h.common_reporters, 1);
        assert_eq!(h2h.entries.len(), 2);
        assert_eq!(h2h.entries[0].configuration_id, id(0));
        assert_eq!(h2h.entries[0].mean_strength_db, Some(-5.0));
        assert_eq!(h2h.entries[0].reporters_reached, 1);
        assert_eq!(h2h.entries[1].mean_strength_db, Some(-9.0));
    }

    #[test]
    fn test_head_to_head_empty_without_overlap() {
        let records = vec![
            rec(0, Band::M20, Some("W1AW"), Some(-5.0), None),
            rec(1, Band::M20, Some("K1ABC"), Some(-9.0), None),
        ];
        let report = build(&[0, 1], &records);
        assert_eq!(report.bands[0].head_to_head, HeadToHead::default());
    }

    #[test]
    fn test_overall_includes_configuration_without_records() {
        let records = vec![
            rec(0, Band::M20, None, Some(-4.0), None),
            rec(0, Band::M40, None, Some(-8.0), None),
        ];
        let report = build(&[0, 1], &records);

        assert_eq!(report.overall.len(), 2);
        assert_eq!(report.overall[0].configuration_id, id(0));
        assert_eq!(report.overall[0].mean_strength_db, Some(-6.0));
        assert_eq!(report.overall[0].strength_stddev_db, Some(2.0));
        assert_eq!(report.overall[0].bands_heard, 2);
        assert_eq!(report.overall[1].configuration_id, id(1));
        assert_eq!(report.overall[1].report_count, 0);
        assert_eq!(report.overall[1].rank, 2);

        assert_eq!(report.completeness.len(), 2);
        assert_eq!(report.completeness[1].total_records, 0);
        assert_eq!(report.completeness[1].file_name.as_deref(), Some("ant1.adi"));
    }

    #[test]
    fn test_scatter_needs_both_metrics() {
        let records = vec![
            rec(0, Band::M20, None, Some(-4.0), Some(900.0)),
            rec(0, Band::M20, None, Some(-8.0), None),
            rec(0, Band::M20, None, None, Some(50.0)),
            rec(0, Band::M20, None, Some(-1.0), Some(20.0)),
        ];
        let report = build(&[0, 1], &records);
        let points = &report.scatter[0].points;
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].distance_km, 20.0);
        assert_eq!(points[1].distance_km, 900.0);
        assert!(report.scatter[1].points.is_empty());
    }
}
