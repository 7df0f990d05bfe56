//! Per-day aggregation of hourly metrics, over the full 24-hour window or
//! restricted to the daylight window between sunrise and sunset.
//!
//! A day that cannot be compared fairly with complete days is never
//! averaged over fewer points: its requested metrics come out as null while
//! the row itself is kept.

use crate::transform::error::TransformError;
use crate::transform::naming::aggregate_name;
use crate::transform::SeriesTransform;
use crate::types::columns::{COL_DATE, COL_SUNRISE, COL_SUNSET, COL_TIME, HOURS_PER_DAY};
use crate::types::weather_series::{SeriesKind, WeatherSeries};
use polars::prelude::*;
use std::iter::once;

const SAMPLE_COUNT: &str = "__samples";
const DECIMALS: u32 = 3;

/// The reduction applied to each group of hourly samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Sum,
}

impl Statistic {
    fn prefix(&self) -> &'static str {
        match self {
            Statistic::Mean => "avg_",
            Statistic::Sum => "total_",
        }
    }

    fn apply(&self, expr: Expr) -> Expr {
        match self {
            Statistic::Mean => expr.mean(),
            Statistic::Sum => expr.sum(),
        }
    }
}

/// The part of each calendar day that is aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// All samples of the day; only defined when the day holds exactly 24.
    FullDay,
    /// Samples with `sunrise <= time <= sunset`; only defined when both bounds are known.
    Daylight,
}

impl Window {
    fn suffix(&self) -> &'static str {
        match self {
            Window::FullDay => "_24h",
            Window::Daylight => "_daylight",
        }
    }
}

/// One aggregation over a list of hourly metrics, producing one row per
/// `date` in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    statistic: Statistic,
    window: Window,
    metrics: Vec<String>,
}

impl Aggregation {
    pub fn new<I, S>(statistic: Statistic, window: Window, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            statistic,
            window,
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    /// Mean per day over all 24 samples, columns named `avg_<metric>_24h`.
    pub fn average_over_full_day<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Statistic::Mean, Window::FullDay, metrics)
    }

    /// Sum per day over all 24 samples, columns named `total_<metric>_24h`.
    pub fn total_over_full_day<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Statistic::Sum, Window::FullDay, metrics)
    }

    /// Mean per day over the daylight window, columns named `avg_<metric>_daylight`.
    pub fn average_over_daylight<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Statistic::Mean, Window::Daylight, metrics)
    }

    /// Sum per day over the daylight window, columns named `total_<metric>_daylight`.
    pub fn total_over_daylight<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Statistic::Sum, Window::Daylight, metrics)
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn output_names(&self) -> Vec<String> {
        self.metrics
            .iter()
            .map(|m| aggregate_name(m, self.statistic.prefix(), self.window.suffix()))
            .collect()
    }

    fn reductions(&self, names: &[String]) -> Vec<Expr> {
        self.metrics
            .iter()
            .zip(names)
            .map(|(metric, name)| {
                self.statistic
                    .apply(col(metric.as_str()))
                    .round(DECIMALS)
                    .alias(name.as_str())
            })
            .collect()
    }

    fn full_day(&self, series: &WeatherSeries) -> LazyFrame {
        let names = self.output_names();
        let reductions = self
            .reductions(&names)
            .into_iter()
            .chain(once(col(COL_TIME).count().alias(SAMPLE_COUNT)));

        let complete = col(SAMPLE_COUNT).eq(lit(HOURS_PER_DAY));
        series
            .hourly_lazy()
            .group_by([col(COL_DATE)])
            .agg(reductions.collect::<Vec<_>>())
            .select(gate_metrics(&names, complete))
            .sort([COL_DATE], SortMultipleOptions::default())
    }

    fn daylight(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError> {
        for bound in [COL_SUNRISE, COL_SUNSET] {
            if series.daily().column(bound).is_err() {
                return Err(TransformError::schema(format!("daily.{bound}")));
            }
        }

        let names = self.output_names();
        let bounds = series
            .daily_lazy()
            .select([col(COL_DATE), col(COL_SUNRISE), col(COL_SUNSET)]);
        let hourly_columns: Vec<Expr> = [COL_TIME, COL_DATE]
            .into_iter()
            .chain(self.metrics.iter().map(String::as_str))
            .map(col)
            .collect();

        let within = col(COL_TIME)
            .gt_eq(col(COL_SUNRISE))
            .and(col(COL_TIME).lt_eq(col(COL_SUNSET)));
        // Samples of days with an unknown bound pass through so the day
        // still appears, nulled, in the output.
        let unknown_bounds = || col(COL_SUNRISE).is_null().or(col(COL_SUNSET).is_null());

        let reductions = self.reductions(&names).into_iter().chain([
            col(COL_SUNRISE).mean().alias(COL_SUNRISE),
            col(COL_SUNSET).mean().alias(COL_SUNSET),
        ]);

        Ok(series
            .hourly_lazy()
            .select(hourly_columns)
            .left_join(bounds, col(COL_DATE), col(COL_DATE))
            .filter(within.or(unknown_bounds()))
            .group_by([col(COL_DATE)])
            .agg(reductions.collect::<Vec<_>>())
            .select(gate_metrics(&names, unknown_bounds().not()))
            .sort([COL_DATE], SortMultipleOptions::default()))
    }
}

/// `date` followed by each named column, nulled wherever `defined` is false.
fn gate_metrics(names: &[String], defined: Expr) -> Vec<Expr> {
    once(col(COL_DATE))
        .chain(names.iter().map(|name| {
            when(defined.clone())
                .then(col(name.as_str()))
                .otherwise(lit(NULL).cast(DataType::Float64))
                .alias(name.as_str())
        }))
        .collect()
}

impl SeriesTransform for Aggregation {
    fn key(&self, _series: &WeatherSeries) -> Result<SeriesKind, TransformError> {
        Ok(SeriesKind::Daily)
    }

    fn transform(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError> {
        series.require_columns(SeriesKind::Hourly, &self.metrics)?;
        match self.window {
            Window::FullDay => Ok(self.full_day(series)),
            Window::Daylight => self.daylight(series),
        }
    }
}
