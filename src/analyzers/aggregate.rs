use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::analyzers::types::{AggregateBucket, DistanceStats, StrengthStats};
use crate::analyzers::utility::{mean, median, sorted};
use crate::normalize::NormalizedRecord;
use crate::normalize::band::Band;
use crate::record::ConfigurationId;

/// The values a configuration is ranked on.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Standing {
    pub configuration_id: ConfigurationId,
    pub mean_strength_db: Option<f64>,
    pub report_count: usize,
}

/// Ranking order: mean strength descending, then report count descending,
/// then configuration id ascending. Configurations without strength data
/// come after all that have it.
pub(crate) fn compare_standing(a: &Standing, b: &Standing) -> Ordering {
    let by_count_then_id = b
        .report_count
        .cmp(&a.report_count)
        .then(a.configuration_id.cmp(&b.configuration_id));

    match (a.mean_strength_db, b.mean_strength_db) {
        (Some(x), Some(y)) => y.total_cmp(&x).then(by_count_then_id),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => by_count_then_id,
    }
}

/// Computes the statistics of one `(configuration, band)` bucket. The rank
/// is left at 0 until the band is ranked.
pub fn bucket_stats(
    configuration_id: ConfigurationId,
    band: Band,
    records: &[&NormalizedRecord],
) -> AggregateBucket {
    let strengths = sorted(records.iter().filter_map(|r| r.signal_strength_db));
    let distances = sorted(records.iter().filter_map(|r| r.distance_km));

    let strength = match (mean(&strengths), median(&strengths)) {
        (Some(mean_db), Some(median_db)) => Some(StrengthStats {
            mean_db,
            median_db,
            best_db: strengths[strengths.len() - 1],
            worst_db: strengths[0],
        }),
        _ => None,
    };

    let distance = mean(&distances).map(|mean_km| DistanceStats {
        mean_km,
        max_km: distances[distances.len() - 1],
    });

    AggregateBucket {
        configuration_id,
        band,
        rank: 0,
        report_count: records.len(),
        strength_count: strengths.len(),
        distance_count: distances.len(),
        strength,
        distance,
    }
}

/// Groups records by `(configuration, band)` and ranks the configurations
/// within each band.
///
/// Pure and deterministic: the same set of records in any order yields the
/// same buckets.
pub fn aggregate(records: &[NormalizedRecord]) -> BTreeMap<Band, Vec<AggregateBucket>> {
    let mut groups: BTreeMap<(Band, ConfigurationId), Vec<&NormalizedRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.band, record.configuration_id))
            .or_default()
            .push(record);
    }

    let mut bands: BTreeMap<Band, Vec<AggregateBucket>> = BTreeMap::new();
    for ((band, configuration_id), group) in &groups {
        bands
            .entry(*band)
            .or_default()
            .push(bucket_stats(*configuration_id, *band, group));
    }

    for (band, buckets) in bands.iter_mut() {
        buckets.sort_by(|a, b| compare_standing(&standing(a), &standing(b)));
        for (i, bucket) in buckets.iter_mut().enumerate() {
            bucket.rank = i + 1;
        }
        debug!(
            band = %band,
            configurations = buckets.len(),
            leader = buckets.first().map(|b| b.configuration_id.value()),
            "Ranked band"
        );
    }

    bands
}

fn standing(bucket: &AggregateBucket) -> Standing {
    Standing {
        configuration_id: bucket.configuration_id,
        mean_strength_db: bucket.mean_strength_db(),
        report_count: bucket.report_count,
    }
}
