//! Column naming shared by the aggregator and the unit converter, so the two
//! never disagree on what a derived column is called.

/// Unit suffixes a converted column may carry, with their replacement in
/// aggregated names. `_m_per_s` and `_mm` must be tried before `_m`.
const UNIT_SUFFIXES: [(&str, &str); 4] = [
    ("_m_per_s", ""),
    ("_celsius", ""),
    ("_mm", ""),
    ("_m", ""),
];

const AGGREGATE_PREFIXES: [&str; 2] = ["avg_", "total_"];

/// Name of an aggregated column: `prefix` + metric stem + `suffix`.
///
/// ```
/// use open_meteo_etl::naming::aggregate_name;
///
/// assert_eq!(aggregate_name("wind_speed_10m", "avg_", "_24h"), "avg_wind_speed_10m_24h");
/// assert_eq!(aggregate_name("temperature_2m_celsius", "avg_", "_24h"), "avg_temperature_2m_24h");
/// assert_eq!(aggregate_name("rain_mm", "total_", "_daylight"), "total_rain_daylight");
/// ```
pub fn aggregate_name(metric: &str, prefix: &str, suffix: &str) -> String {
    let stem = UNIT_SUFFIXES
        .iter()
        .find_map(|(token, replacement)| {
            metric
                .strip_suffix(token)
                .map(|stem| format!("{stem}{replacement}"))
        })
        .unwrap_or_else(|| metric.to_string());
    format!("{prefix}{stem}{suffix}")
}

/// Name of a unit-converted column. Aggregated columns already encode their
/// meaning and keep their name.
pub fn converted_name(metric: &str, unit_suffix: &str) -> String {
    if is_aggregate(metric) {
        metric.to_string()
    } else {
        format!("{metric}{unit_suffix}")
    }
}

pub fn is_aggregate(metric: &str) -> bool {
    AGGREGATE_PREFIXES.iter().any(|p| metric.starts_with(p))
}

/// Name of an ISO-8601 rendering of a timestamp column.
pub fn iso_name(metric: &str) -> String {
    format!("{metric}_iso")
}
