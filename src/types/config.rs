//! Explicit configuration of one ETL run: what to request, how to transform
//! it and where to persist it. `Default` reproduces the Novosibirsk run.

use crate::load::report::ConflictResolution;
use crate::transform::aggregator::Aggregation;
use crate::transform::time_normalizer::OffsetRule;
use crate::transform::unit_converter::UnitConversion;
use crate::types::columns::{COL_DATE_UNIX, COL_TIME_UNIX};
use bon::Builder;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_LATITUDE: f64 = 55.0344;
pub const DEFAULT_LONGITUDE: f64 = 82.9434;

const DEFAULT_HOURLY_VARIABLES: [&str; 18] = [
    "temperature_2m",
    "relative_humidity_2m",
    "dew_point_2m",
    "apparent_temperature",
    "temperature_80m",
    "temperature_120m",
    "wind_speed_10m",
    "wind_speed_80m",
    "wind_direction_10m",
    "wind_direction_80m",
    "visibility",
    "evapotranspiration",
    "weather_code",
    "soil_temperature_0cm",
    "soil_temperature_6cm",
    "rain",
    "showers",
    "snowfall",
];

const DEFAULT_DAILY_VARIABLES: [&str; 3] = ["sunrise", "sunset", "daylight_duration"];

const DEFAULT_AVERAGED: [&str; 9] = [
    "temperature_2m_celsius",
    "relative_humidity_2m",
    "dew_point_2m_celsius",
    "apparent_temperature_celsius",
    "temperature_80m_celsius",
    "temperature_120m_celsius",
    "wind_speed_10m_m_per_s",
    "wind_speed_80m_m_per_s",
    "visibility_m",
];

const DEFAULT_TOTALLED: [&str; 3] = ["rain_mm", "showers_mm", "snowfall_mm"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 16).unwrap_or_default()
}

fn default_end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 30).unwrap_or_default()
}

/// Query sent to the Open-Meteo forecast endpoint.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct ForecastRequest {
    #[builder(default = DEFAULT_LATITUDE)]
    pub latitude: f64,
    #[builder(default = DEFAULT_LONGITUDE)]
    pub longitude: f64,
    #[builder(default = default_start_date())]
    pub start_date: NaiveDate,
    #[builder(default = default_end_date())]
    pub end_date: NaiveDate,
    #[builder(into, default = String::from("auto"))]
    pub timezone: String,
    #[builder(into, default = String::from("unixtime"))]
    pub timeformat: String,
    #[builder(into, default = String::from("kn"))]
    pub wind_speed_unit: String,
    #[builder(into, default = String::from("fahrenheit"))]
    pub temperature_unit: String,
    #[builder(into, default = String::from("inch"))]
    pub precipitation_unit: String,
    #[builder(default = strings(&DEFAULT_HOURLY_VARIABLES))]
    pub hourly: Vec<String>,
    #[builder(default = strings(&DEFAULT_DAILY_VARIABLES))]
    pub daily: Vec<String>,
    #[builder(into, default = String::from(DEFAULT_BASE_URL))]
    pub base_url: String,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ForecastRequest {
    /// Query parameters in the order the endpoint documents them; variable
    /// lists are comma-joined.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("daily", self.daily.join(",")),
            ("hourly", self.hourly.join(",")),
            ("timezone", self.timezone.clone()),
            ("timeformat", self.timeformat.clone()),
            ("wind_speed_unit", self.wind_speed_unit.clone()),
            ("temperature_unit", self.temperature_unit.clone()),
            ("precipitation_unit", self.precipitation_unit.clone()),
            ("start_date", self.start_date.format("%Y-%m-%d").to_string()),
            ("end_date", self.end_date.format("%Y-%m-%d").to_string()),
        ]
    }
}

/// Which conversions and derived columns the transform stage produces.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct TransformPlan {
    #[builder(default)]
    pub offset_rule: OffsetRule,
    #[builder(default = default_conversions())]
    pub conversions: Vec<UnitConversion>,
    /// Hourly columns kept as-is next to the converted ones.
    #[builder(default = strings(&["relative_humidity_2m"]))]
    pub passthrough: Vec<String>,
    #[builder(default = default_aggregations())]
    pub aggregations: Vec<Aggregation>,
    #[builder(default = true)]
    pub daylight_hours: bool,
    /// Daily timestamp columns rendered as ISO-8601 strings.
    #[builder(default = strings(&["sunrise", "sunset"]))]
    pub iso_columns: Vec<String>,
    /// Hourly columns dropped from the exported hourly table.
    #[builder(default = strings(&["relative_humidity_2m", "dew_point_2m_celsius", "visibility_m"]))]
    pub hourly_exclusions: Vec<String>,
}

impl Default for TransformPlan {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_conversions() -> Vec<UnitConversion> {
    vec![
        UnitConversion::knots_to_meters_per_second(["wind_speed_10m", "wind_speed_80m"]),
        UnitConversion::feet_to_meters(["visibility"]),
        UnitConversion::fahrenheit_to_celsius([
            "temperature_2m",
            "dew_point_2m",
            "apparent_temperature",
            "temperature_80m",
            "temperature_120m",
            "soil_temperature_0cm",
            "soil_temperature_6cm",
        ]),
        UnitConversion::inches_to_millimeters(["rain", "showers", "snowfall"]),
    ]
}

fn default_aggregations() -> Vec<Aggregation> {
    vec![
        Aggregation::average_over_full_day(DEFAULT_AVERAGED),
        Aggregation::total_over_full_day(DEFAULT_TOTALLED),
        Aggregation::average_over_daylight(DEFAULT_AVERAGED),
        Aggregation::total_over_daylight(DEFAULT_TOTALLED),
    ]
}

/// One relational table the loader writes to.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct TableTarget {
    #[builder(into)]
    pub table: String,
    #[builder(into)]
    pub key: String,
}

/// Where the two output tables are persisted.
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct OutputTargets {
    #[builder(into, default = PathBuf::from("res/hourly.csv"))]
    pub hourly_csv: PathBuf,
    #[builder(into, default = PathBuf::from("res/daily.csv"))]
    pub daily_csv: PathBuf,
    #[builder(into, default = PathBuf::from("res/open_meteo_stats.sqlite"))]
    pub database: PathBuf,
    #[builder(default = TableTarget::builder().table("hourly").key(COL_TIME_UNIX).build())]
    pub hourly_table: TableTarget,
    #[builder(default = TableTarget::builder().table("daily").key(COL_DATE_UNIX).build())]
    pub daily_table: TableTarget,
    #[builder(default)]
    pub conflict_resolution: ConflictResolution,
}

impl Default for OutputTargets {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Everything one run of [`crate::OpenMeteoEtl`] needs.
///
/// ```
/// use open_meteo_etl::{ConflictResolution, EtlConfig, OutputTargets};
///
/// let config = EtlConfig::builder()
///     .output(
///         OutputTargets::builder()
///             .daily_csv("out/daily.csv")
///             .conflict_resolution(ConflictResolution::Overwrite)
///             .build(),
///     )
///     .build();
/// assert_eq!(config.request.latitude, 55.0344);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Builder)]
pub struct EtlConfig {
    #[builder(default)]
    pub request: ForecastRequest,
    #[builder(default)]
    pub plan: TransformPlan,
    #[builder(default)]
    pub output: OutputTargets,
}
