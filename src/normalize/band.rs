//! Amateur band table and frequency-to-band resolution.

use serde::Serialize;
use std::fmt;

/// A named amateur-radio band. Variants are declared in ascending frequency
/// order so the derived `Ord` sorts bands the way they are charted, with
/// [`Band::Unknown`] last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Band {
    #[serde(rename = "160m")]
    M160,
    #[serde(rename = "80m")]
    M80,
    #[serde(rename = "60m")]
    M60,
    #[serde(rename = "40m")]
    M40,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "20m")]
    M20,
    #[serde(rename = "17m")]
    M17,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "12m")]
    M12,
    #[serde(rename = "10m")]
    M10,
    #[serde(rename = "6m")]
    M6,
    #[serde(rename = "2m")]
    M2,
    #[serde(rename = "unknown")]
    Unknown,
}

/// Band edges in Hz, lower bound inclusive, upper bound exclusive.
static BAND_EDGES: &[(Band, f64, f64)] = &[
    (Band::M160, 1_800_000.0, 2_000_000.0),
    (Band::M80, 3_500_000.0, 4_000_000.0),
    (Band::M60, 5_060_000.0, 5_450_000.0),
    (Band::M40, 7_000_000.0, 7_300_000.0),
    (Band::M30, 10_100_000.0, 10_150_000.0),
    (Band::M20, 14_000_000.0, 14_350_000.0),
    (Band::M17, 18_068_000.0, 18_168_000.0),
    (Band::M15, 21_000_000.0, 21_450_000.0),
    (Band::M12, 24_890_000.0, 24_990_000.0),
    (Band::M10, 28_000_000.0, 29_700_000.0),
    (Band::M6, 50_000_000.0, 54_000_000.0),
    (Band::M2, 144_000_000.0, 148_000_000.0),
];

impl Band {
    /// Looks up the band containing `frequency_hz`, if any.
    pub fn from_frequency_hz(frequency_hz: f64) -> Option<Band> {
        BAND_EDGES
            .iter()
            .find(|(_, lo, hi)| frequency_hz >= *lo && frequency_hz < *hi)
            .map(|(band, _, _)| *band)
    }

    /// Parses an ADIF `BAND` value such as `20m` or `20M`. Returns `None` for
    /// bands outside the table, including the literal `unknown`.
    pub fn from_label(label: &str) -> Option<Band> {
        let label = label.trim();
        BAND_EDGES
            .iter()
            .map(|(band, _, _)| *band)
            .find(|band| band.label().eq_ignore_ascii_case(label))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Band::M160 => "160m",
            Band::M80 => "80m",
            Band::M60 => "60m",
            Band::M40 => "40m",
            Band::M30 => "30m",
            Band::M20 => "20m",
            Band::M17 => "17m",
            Band::M15 => "15m",
            Band::M12 => "12m",
            Band::M10 => "10m",
            Band::M6 => "6m",
            Band::M2 => "2m",
            Band::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_band_edges() {
        assert_eq!(Band::from_frequency_hz(14_074_000.0), Some(Band::M20));
        assert_eq!(Band::from_frequency_hz(14_000_000.0), Some(Band::M20));
        assert_eq!(Band::from_frequency_hz(14_350_000.0), None);
        assert_eq!(Band::from_frequency_hz(7_074_000.0), Some(Band::M40));
        assert_eq!(Band::from_frequency_hz(10_136_000.0), Some(Band::M30));
        assert_eq!(Band::from_frequency_hz(28_074_000.0), Some(Band::M10));
    }

    #[test]
    fn test_out_of_band_frequency() {
        assert_eq!(Band::from_frequency_hz(13_000_000.0), None);
        assert_eq!(Band::from_frequency_hz(0.0), None);
        assert_eq!(Band::from_frequency_hz(-14_074_000.0), None);
    }

    #[test]
    fn test_label_parsing_ignores_case() {
        assert_eq!(Band::from_label("20m"), Some(Band::M20));
        assert_eq!(Band::from_label(" 40M "), Some(Band::M40));
        assert_eq!(Band::from_label("2190m"), None);
        assert_eq!(Band::from_label("unknown"), None);
    }

    #[test]
    fn test_bands_sort_by_frequency_unknown_last() {
        let mut bands = vec![Band::Unknown, Band::M10, Band::M40, Band::M20];
        bands.sort();
        assert_eq!(bands, vec![Band::M40, Band::M20, Band::M10, Band::Unknown]);
    }

    #[test]
    fn test_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Band::M17).unwrap(), "\"17m\"");
        assert_eq!(serde_json::to_string(&Band::Unknown).unwrap(), "\"unknown\"");
    }
}
