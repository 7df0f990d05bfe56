//! Deserialized form of an Open-Meteo forecast payload.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Declared unit per column, e.g. `{"temperature_2m": "°F", "time": "unixtime"}`.
pub type UnitTable = HashMap<String, String>;

/// The raw API response for one point, consumed once to build a
/// [`crate::WeatherSeries`].
///
/// Unit tables and series blocks are optional at the type level so that a
/// non-conformant payload surfaces as a [`crate::TransformError::Schema`]
/// naming the missing field instead of an opaque decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenMeteoResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub generationtime_ms: Option<f64>,
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub timezone: Option<String>,
    /// e.g. `GMT+7`. Its sign character drives the offset direction
    /// under [`crate::OffsetRule::AbbreviationSign`].
    pub timezone_abbreviation: String,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub hourly_units: Option<UnitTable>,
    #[serde(default)]
    pub hourly: Option<RawBlock>,
    #[serde(default)]
    pub daily_units: Option<UnitTable>,
    #[serde(default)]
    pub daily: Option<RawBlock>,
}

/// One time-series block (`hourly` or `daily`): column name to a JSON array,
/// index-aligned with the block's `time` column. Column order follows the payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RawBlock {
    pub columns: Map<String, Value>,
}

impl RawBlock {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}

impl OpenMeteoResponse {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fixture() -> Result<(), Box<dyn std::error::Error>> {
        let response = OpenMeteoResponse::from_json_str(include_str!(
            "../../testdata/forecast_novosibirsk.json"
        ))?;
        assert_eq!(response.utc_offset_seconds, 25200);
        assert_eq!(response.timezone_abbreviation, "GMT+7");

        let hourly = response.hourly.as_ref().ok_or("hourly block missing")?;
        let names: Vec<&str> = hourly.names().collect();
        assert_eq!(
            names,
            [
                "time",
                "temperature_2m",
                "relative_humidity_2m",
                "wind_speed_10m",
                "visibility",
                "snowfall"
            ]
        );
        assert_eq!(
            response
                .hourly_units
                .as_ref()
                .and_then(|u| u.get("temperature_2m"))
                .map(String::as_str),
            Some("°F")
        );
        Ok(())
    }

    #[test]
    fn test_missing_blocks_still_decode() -> Result<(), serde_json::Error> {
        let response = OpenMeteoResponse::from_json_str(
            r#"{"latitude": 1.0, "longitude": 2.0, "utc_offset_seconds": 0, "timezone_abbreviation": "GMT"}"#,
        )?;
        assert!(response.hourly_units.is_none());
        assert!(response.daily.is_none());
        Ok(())
    }
}
