//! Presentation columns: ISO-8601 renderings of timestamp columns and the
//! daylight duration of each day.

use crate::transform::error::TransformError;
use crate::transform::naming::iso_name;
use crate::transform::time_normalizer::TimeEncoding;
use crate::transform::SeriesTransform;
use crate::types::columns::{
    COL_DATE, COL_DAYLIGHT_HOURS, COL_SUNRISE, COL_SUNSET, SECONDS_PER_HOUR, UNIT_UNIXTIME,
};
use crate::types::weather_series::{SeriesKind, WeatherSeries};
use polars::prelude::*;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Renders epoch-second columns as `YYYY-MM-DDTHH:MM:SSZ` strings in
/// columns suffixed `_iso`.
///
/// The metrics must all be declared in exactly one of the two tables; the
/// output is keyed by that table's key (`date` or `time`).
#[derive(Debug, Clone, PartialEq)]
pub struct IsoTimestamps {
    metrics: Vec<String>,
}

impl IsoTimestamps {
    pub fn new<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn output_names(&self) -> Vec<String> {
        self.metrics.iter().map(|m| iso_name(m)).collect()
    }

    fn table(&self, series: &WeatherSeries) -> Result<SeriesKind, TransformError> {
        let declared_in = |kind| {
            self.metrics
                .iter()
                .all(|m| series.units(kind).contains_key(m))
        };
        match (
            declared_in(SeriesKind::Hourly),
            declared_in(SeriesKind::Daily),
        ) {
            (true, false) => Ok(SeriesKind::Hourly),
            (false, true) => Ok(SeriesKind::Daily),
            _ => Err(TransformError::AmbiguousColumnSet {
                metrics: self.metrics.clone(),
            }),
        }
    }
}

impl SeriesTransform for IsoTimestamps {
    fn key(&self, series: &WeatherSeries) -> Result<SeriesKind, TransformError> {
        self.table(series)
    }

    fn transform(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError> {
        let kind = self.table(series)?;
        let not_timestamps: Vec<String> = self
            .metrics
            .iter()
            .filter(|m| {
                series
                    .unit_of(kind, m)
                    .and_then(TimeEncoding::from_unit)
                    .is_none()
            })
            .cloned()
            .collect();
        if !not_timestamps.is_empty() {
            return Err(TransformError::UnitMismatch {
                expected: "unixtime or iso8601".to_string(),
                metrics: not_timestamps,
            });
        }
        series.require_columns(kind, &self.metrics)?;

        let mut columns = vec![col(kind.key())];
        columns.extend(self.metrics.iter().zip(self.output_names()).map(|(metric, name)| {
            (col(metric.as_str()).cast(DataType::Int64) * lit(1000i64))
                .cast(DataType::Datetime(TimeUnit::Milliseconds, None))
                .dt()
                .strftime(ISO_FORMAT)
                .alias(name)
        }));
        let frame = match kind {
            SeriesKind::Hourly => series.hourly_lazy(),
            SeriesKind::Daily => series.daily_lazy(),
        };
        Ok(frame.select(columns))
    }
}

/// `(sunset − sunrise) / 3600` per day, rounded to one decimal, keyed by
/// `date`. The raw bounds are not carried into the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaylightHours;

impl SeriesTransform for DaylightHours {
    fn key(&self, _series: &WeatherSeries) -> Result<SeriesKind, TransformError> {
        Ok(SeriesKind::Daily)
    }

    fn transform(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError> {
        let not_unixtime: Vec<String> = [COL_SUNRISE, COL_SUNSET]
            .into_iter()
            .filter(|bound| series.unit_of(SeriesKind::Daily, bound) != Some(UNIT_UNIXTIME))
            .map(String::from)
            .collect();
        if !not_unixtime.is_empty() {
            return Err(TransformError::UnitMismatch {
                expected: UNIT_UNIXTIME.to_string(),
                metrics: not_unixtime,
            });
        }
        series.require_columns(SeriesKind::Daily, &[COL_SUNRISE, COL_SUNSET])?;

        let hours = ((col(COL_SUNSET) - col(COL_SUNRISE)).cast(DataType::Float64)
            / lit(SECONDS_PER_HOUR))
        .round(1)
        .alias(COL_DAYLIGHT_HOURS);
        Ok(series.daily_lazy().select([col(COL_DATE), hours]))
    }
}
