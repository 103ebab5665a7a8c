use serde::{Deserialize, Serialize};

use crate::catalog::Coordinates;

/// Body of `POST /horoscope`. Fields are optional at the wire level so that
/// absence is reported as a validation error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HoroscopeRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
}

impl HoroscopeRequest {
    pub fn new(date: &str, time: &str, location: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            location: Some(location.to_string()),
        }
    }
}

/// Request fields echoed back as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoroscopeInput {
    pub date: String,
    pub time: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDto {
    pub planet: String,
    pub longitude: String,
    pub speed: String,
    pub retrograde: bool,
    pub right_ascension: String,
    pub declination: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoroscopeResponse {
    pub input: HoroscopeInput,
    pub coordinates: Coordinates,
    /// Serialized as `null` when not finite.
    pub julian_day: f64,
    pub sidereal_positions: Vec<PositionDto>,
}
