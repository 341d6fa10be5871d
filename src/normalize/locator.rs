//! Maidenhead locator parsing and great-circle distance.

use serde::Serialize;

/// Mean Earth radius in km.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A parsed Maidenhead locator. The reference point is the centre of the
/// square (4 characters) or subsquare (6 or more characters).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Locator {
    pub grid: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Locator {
    /// Parses a 4, 6 or 8 character locator, ignoring case.
    ///
    /// Returns `None` for anything else; a malformed locator is treated as
    /// absent rather than as an error.
    pub fn parse(text: &str) -> Option<Locator> {
        let grid = text.trim().to_ascii_uppercase();
        let chars = grid.as_bytes();

        if !matches!(chars.len(), 4 | 6 | 8) {
            return None;
        }

        let field = |c: u8| (b'A'..=b'R').contains(&c).then(|| f64::from(c - b'A'));
        let digit = |c: u8| c.is_ascii_digit().then(|| f64::from(c - b'0'));
        let subsquare = |c: u8| (b'A'..=b'X').contains(&c).then(|| f64::from(c - b'A'));

        let mut longitude = field(chars[0])? * 20.0 - 180.0 + digit(chars[2])? * 2.0;
        let mut latitude = field(chars[1])? * 10.0 - 90.0 + digit(chars[3])?;

        if chars.len() >= 6 {
            longitude += subsquare(chars[4])? * (2.0 / 24.0) + 1.0 / 24.0;
            latitude += subsquare(chars[5])? * (1.0 / 24.0) + 1.0 / 48.0;
        } else {
            longitude += 1.0;
            latitude += 0.5;
        }

        if chars.len() == 8 {
            digit(chars[6])?;
            digit(chars[7])?;
        }

        Some(Locator {
            grid,
            latitude,
            longitude,
        })
    }

    /// Great-circle distance in km to `other` (haversine).
    pub fn distance_km(&self, other: &Locator) -> f64 {
        great_circle_distance(
            self.latitude.to_radians(),
            self.longitude.to_radians(),
            other.latitude.to_radians(),
            other.longitude.to_radians(),
        )
    }
}

/// Determines the distance in km between two points given in radians.
fn great_circle_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    2.0 * EARTH_RADIUS_KM
        * f64::asin(f64::sqrt(
            f64::powi(f64::sin((lat1 - lat2) / 2.0), 2)
                + f64::cos(lat1) * f64::cos(lat2) * f64::powi(f64::sin((lng1 - lng2) / 2.0), 2),
        ))
}
