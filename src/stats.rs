use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::grade::Grade;
use crate::normalize::NormalizedRecord;
use crate::normalize::band::Band;
use crate::record::ConfigurationId;

/// Data completeness of one configuration's file: how many records carried
/// each field after decoding and normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetStats {
    pub configuration_id: u8,
    pub file_name: Option<String>,
    pub total_records: usize,

    // reporter fields
    pub with_callsign: usize,
    pub with_locator: usize,
    pub with_valid_locator: usize,

    // radio fields
    pub with_frequency: usize,
    pub with_explicit_band: usize,
    pub unknown_band: usize,
    pub with_signal_strength: usize,
    pub with_timestamp: usize,
    pub with_distance: usize,

    pub first_report: Option<DateTime<Utc>>,
    pub last_report: Option<DateTime<Utc>>,

    pub strength_coverage_pct: f64,
    pub completeness_grade: Grade,
}

impl DatasetStats {
    pub fn from_records<'a>(
        configuration_id: ConfigurationId,
        records: impl IntoIterator<Item = &'a NormalizedRecord>,
    ) -> Self {
        let mut s = DatasetStats {
            configuration_id: configuration_id.value(),
            ..Default::default()
        };

        for r in records {
            s.total_records += 1;

            if r.reporter_callsign.is_some() {
                s.with_callsign += 1;
            }

            if r.reporter_grid.is_some() {
                s.with_locator += 1;
            }

            if r.reporter_locator.is_some() {
                s.with_valid_locator += 1;
            }

            if r.frequency_hz.is_some() {
                s.with_frequency += 1;
            }

            if r.band_explicit {
                s.with_explicit_band += 1;
            }

            if r.band == Band::Unknown {
                s.unknown_band += 1;
            }

            if r.signal_strength_db.is_some() {
                s.with_signal_strength += 1;
            }

            if r.distance_km.is_some() {
                s.with_distance += 1;
            }

            if let Some(ts) = r.timestamp_utc {
                s.with_timestamp += 1;
                s.first_report = Some(s.first_report.map_or(ts, |first| first.min(ts)));
                s.last_report = Some(s.last_report.map_or(ts, |last| last.max(ts)));
            }
        }

        s.strength_coverage_pct = Self::pct(s.with_signal_strength, s.total_records);
        s.completeness_grade = Grade::from_coverage(s.strength_coverage_pct / 100.0);
        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn distance_pct(&self) -> f64 {
        Self::pct(self.with_distance, self.total_records)
    }

    /// Set the name of the file the records came from
    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }
}
