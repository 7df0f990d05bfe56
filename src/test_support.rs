//! Shared fixtures for unit tests: a recorded forecast for Novosibirsk
//! (GMT+7), 2025-05-28 to 2025-05-30, 72 hourly samples.

use crate::transform::time_normalizer::OffsetRule;
use crate::types::response::OpenMeteoResponse;
use crate::types::weather_series::WeatherSeries;
use std::error::Error;

pub const FIXTURE_JSON: &str = include_str!("../testdata/forecast_novosibirsk.json");

/// Local midnights of the three fixture days.
pub const FIXTURE_DATES: [i64; 3] = [1748390400, 1748476800, 1748563200];

pub fn fixture_response() -> Result<OpenMeteoResponse, Box<dyn Error>> {
    Ok(OpenMeteoResponse::from_json_str(FIXTURE_JSON)?)
}

pub fn fixture_series() -> Result<WeatherSeries, Box<dyn Error>> {
    series_from(|_| {})
}

/// Builds a series from the fixture after applying `edit` to the raw payload.
pub fn series_from(
    edit: impl FnOnce(&mut OpenMeteoResponse),
) -> Result<WeatherSeries, Box<dyn Error>> {
    let mut response = fixture_response()?;
    edit(&mut response);
    Ok(WeatherSeries::from_response(
        response,
        OffsetRule::AbbreviationSign,
    )?)
}

/// Aggregates are rounded to 3 decimals; allow one unit in the last place.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= 1.001e-3,
        "expected {expected}, got {actual}"
    );
}
