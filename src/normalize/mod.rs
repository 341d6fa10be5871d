//! Normalization of reception records into comparable form.
//!
//! Resolves each record's band (explicit `BAND`, then frequency, then
//! [`Band::Unknown`]) and its distance (explicit `DISTANCE`, then the
//! great-circle distance between the operator's and the reporter's
//! locators). Normalization never fails: anything that cannot be resolved
//! is simply absent on the output record.

pub mod band;
pub mod locator;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::record::{ConfigurationId, ReceptionRecord};
use band::Band;
use locator::Locator;

/// A reception record with band and distance resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub configuration_id: ConfigurationId,
    pub reporter_callsign: Option<String>,
    /// Raw locator text as reported, kept even when it does not parse.
    pub reporter_grid: Option<String>,
    pub reporter_locator: Option<Locator>,
    pub band: Band,
    /// True when `band` came from the `BAND` tag rather than the frequency.
    pub band_explicit: bool,
    pub frequency_hz: Option<f64>,
    pub signal_strength_db: Option<f64>,
    pub timestamp_utc: Option<DateTime<Utc>>,
    pub distance_km: Option<f64>,
}

/// Resolves band and distance for one record.
pub fn normalize_record(record: &ReceptionRecord, operator: Option<&Locator>) -> NormalizedRecord {
    let (band, band_explicit) = match record.band {
        Some(band) => (band, true),
        None => (
            record
                .frequency_hz
                .and_then(Band::from_frequency_hz)
                .unwrap_or(Band::Unknown),
            false,
        ),
    };

    let reporter_locator = record.reporter_locator.as_deref().and_then(|text| {
        let parsed = Locator::parse(text);
        if parsed.is_none() {
            debug!(
                locator = text,
                configuration_id = record.configuration_id.value(),
                "Unresolvable reporter locator"
            );
        }
        parsed
    });

    let distance_km = record.reported_distance_km.or_else(|| {
        operator
            .zip(reporter_locator.as_ref())
            .map(|(own, theirs)| own.distance_km(theirs))
    });

    NormalizedRecord {
        configuration_id: record.configuration_id,
        reporter_callsign: record.reporter_callsign.clone(),
        reporter_grid: record.reporter_locator.clone(),
        reporter_locator,
        band,
        band_explicit,
        frequency_hz: record.frequency_hz,
        signal_strength_db: record.signal_strength_db,
        timestamp_utc: record.timestamp_utc,
        distance_km,
    }
}

/// Normalizes a merged record set, preserving order.
pub fn normalize(records: &[ReceptionRecord], operator: Option<&Locator>) -> Vec<NormalizedRecord> {
    records
        .iter()
        .map(|record| normalize_record(record, operator))
        .collect()
}
