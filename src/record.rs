//! Typed reception records and the configuration identifier they carry.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CompareError;
use crate::normalize::band::Band;
use crate::parser::RawRecord;

/// Antenna configuration under test, matching the `/0`..`/9` callsign suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfigurationId(u8);

impl ConfigurationId {
    pub const MAX: u8 = 9;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ConfigurationId {
    type Error = CompareError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(CompareError::InvalidConfigurationId(value));
        }
        Ok(ConfigurationId(value))
    }
}

impl fmt::Display for ConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

/// Which ADIF field names the station that heard the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterField {
    /// Reporter is in `CALL`
    #[default]
    Reception,
    /// Reporter is in `OPERATOR`
    Transmission,
}

impl ReporterField {
    fn tag(self) -> &'static str {
        match self {
            ReporterField::Reception => "CALL",
            ReporterField::Transmission => "OPERATOR",
        }
    }
}

impl std::str::FromStr for ReporterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reception" | "rx" => Ok(ReporterField::Reception),
            "transmission" | "tx" => Ok(ReporterField::Transmission),
            other => Err(format!("unknown reporter mode '{other}'")),
        }
    }
}

/// One reported decode of the operator's signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceptionRecord {
    pub configuration_id: ConfigurationId,
    pub reporter_callsign: Option<String>,
    pub reporter_locator: Option<String>,
    pub band: Option<Band>,
    pub frequency_hz: Option<f64>,
    pub signal_strength_db: Option<f64>,
    pub timestamp_utc: Option<DateTime<Utc>>,
    pub reported_distance_km: Option<f64>,
}

impl ReceptionRecord {
    /// Converts a raw ADIF record. Malformed fields are dropped one by one;
    /// the record itself is always produced.
    pub fn from_raw(
        raw: &RawRecord,
        configuration_id: ConfigurationId,
        reporter_field: ReporterField,
    ) -> Self {
        let reporter_callsign = raw
            .get(reporter_field.tag())
            .map(|call| call.to_ascii_uppercase());

        // MY_GRIDSQUARE is the operator's own square, never the reporter's.
        let reporter_locator = raw.get("GRIDSQUARE").map(str::to_string);

        let band = raw.get("BAND").and_then(|label| {
            let band = Band::from_label(label);
            if band.is_none() {
                debug!(band = label, "Ignoring unrecognised band label");
            }
            band
        });

        let frequency_hz = numeric_field(raw, "FREQ")
            .filter(|mhz| *mhz > 0.0)
            .map(|mhz| mhz * 1_000_000.0);

        let signal_strength_db = numeric_field(raw, "APP_PSKREP_SNR").or_else(|| {
            raw.get("RST_RCVD")
                .filter(|rst| rst.starts_with(['+', '-']))
                .and_then(|_| numeric_field(raw, "RST_RCVD"))
        });

        let reported_distance_km = numeric_field(raw, "DISTANCE").filter(|km| *km >= 0.0);

        Self {
            configuration_id,
            reporter_callsign,
            reporter_locator,
            band,
            frequency_hz,
            signal_strength_db,
            timestamp_utc: timestamp(raw),
            reported_distance_km,
        }
    }
}

fn numeric_field(raw: &RawRecord, name: &str) -> Option<f64> {
    let value = raw.get(name)?;
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!(field = name, value, "Dropping malformed numeric field");
            None
        }
    }
}

/// Combines `QSO_DATE` (YYYYMMDD) with `TIME_ON` (HHMMSS or HHMM). A missing
/// time means midnight; an unparsable date drops the timestamp.
fn timestamp(raw: &RawRecord) -> Option<DateTime<Utc>> {
    let date_str = raw.get("QSO_DATE")?;
    let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y%m%d") else {
        debug!(value = date_str, "Dropping malformed QSO_DATE");
        return None;
    };

    let time = match raw.get("TIME_ON") {
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
        Some(t) => match NaiveTime::parse_from_str(t, "%H%M%S")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H%M"))
        {
            Ok(time) => time,
            Err(_) => {
                debug!(value = t, "Dropping malformed TIME_ON");
                return None;
            }
        },
    };

    Some(date.and_time(time).and_utc())
}
