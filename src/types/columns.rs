//! Column names and unit labels shared by every stage of the pipeline.

/// Absolute, local-adjusted timestamp of an hourly sample (seconds since epoch).
pub const COL_TIME: &str = "time";
/// Local-midnight bucket of a sample (seconds since epoch).
pub const COL_DATE: &str = "date";
pub const COL_SUNRISE: &str = "sunrise";
pub const COL_SUNSET: &str = "sunset";
pub const COL_DAYLIGHT_HOURS: &str = "daylight_hours";

// Export keys
pub const COL_TIME_UNIX: &str = "time_unix";
pub const COL_DATE_UNIX: &str = "date_unix";

// Declared units as reported by the API
pub const UNIT_UNIXTIME: &str = "unixtime";
pub const UNIT_ISO8601: &str = "iso8601";
pub const UNIT_FAHRENHEIT: &str = "°F";
pub const UNIT_CELSIUS: &str = "°C";
pub const UNIT_KNOTS: &str = "kn";
pub const UNIT_METERS_PER_SECOND: &str = "m/s";
pub const UNIT_INCH: &str = "inch";
pub const UNIT_MILLIMETER: &str = "mm";
pub const UNIT_FEET: &str = "ft";
pub const UNIT_METER: &str = "m";

pub const SECONDS_PER_DAY: i64 = 86_400;
pub const SECONDS_PER_HOUR: f64 = 3_600.0;
/// A calendar day is only aggregated over its full window when it holds this many samples.
pub const HOURS_PER_DAY: u32 = 24;
