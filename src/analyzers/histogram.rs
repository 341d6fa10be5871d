//! Fixed-edge histograms shared across all configurations of a run.

use crate::analyzers::types::{Histogram, HistogramEdges};

/// Upper bound on bins per metric.
pub const MAX_BINS: usize = 1000;

impl HistogramEdges {
    /// Builds `bins` evenly spaced bins spanning the observed min and max.
    /// Returns `None` when there are no finite values. A single distinct
    /// value gets a span of 1 so that bins keep a non-zero width. `bins` is
    /// clamped to `1..=MAX_BINS`.
    pub fn from_values(values: impl IntoIterator<Item = f64>, bins: usize) -> Option<Self> {
        let bins = bins.clamp(1, MAX_BINS);
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let max = if max > min { max } else { min + 1.0 };
        let width = (max - min) / bins as f64;
        let edges = (0..=bins)
            .map(|i| if i == bins { max } else { min + width * i as f64 })
            .collect();

        Some(HistogramEdges {
            min,
            max,
            width,
            edges,
        })
    }

    pub fn bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    /// Index of the bin holding `value`; the maximum lands in the last bin
    /// and values outside the range are clamped.
    pub fn bin_index(&self, value: f64) -> usize {
        let last = self.bins().saturating_sub(1);
        if value <= self.min {
            return 0;
        }
        let index = ((value - self.min) / self.width).floor() as usize;
        index.min(last)
    }

    /// Counts `values` into bins; `None` entries are counted as unavailable.
    pub fn histogram(&self, values: impl IntoIterator<Item = Option<f64>>) -> Histogram {
        let mut histogram = Histogram {
            counts: vec![0; self.bins()],
            unavailable: 0,
        };
        for value in values {
            match value {
                Some(v) if v.is_finite() => histogram.counts[self.bin_index(v)] += 1,
                _ => histogram.unavailable += 1,
            }
        }
        histogram
    }
}

/// Histogram for a metric nobody reported: every record is unavailable.
pub fn unavailable_histogram(count: usize) -> Histogram {
    Histogram {
        counts: Vec::new(),
        unavailable: count,
    }
}
