//! Rescales hourly metrics from the units requested from the API
//! (°F, knots, inches, feet) to metric units, renaming the columns.

use crate::transform::error::TransformError;
use crate::transform::naming::converted_name;
use crate::transform::SeriesTransform;
use crate::types::columns::*;
use crate::types::response::UnitTable;
use crate::types::weather_series::{SeriesKind, WeatherSeries};
use log::debug;
use polars::prelude::*;

const DECIMALS: u32 = 1;

/// A fixed linear unit transform.
///
/// | Conversion | Formula | Suffix |
/// |---|---|---|
/// | `FahrenheitToCelsius` | (x − 32) × 5/9 | `_celsius` |
/// | `KnotsToMetersPerSecond` | x × 0.514 | `_m_per_s` |
/// | `InchesToMillimeters` | x × 25.4 | `_mm` |
/// | `FeetToMeters` | x × 0.3048 | `_m` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    FahrenheitToCelsius,
    KnotsToMetersPerSecond,
    InchesToMillimeters,
    FeetToMeters,
}

impl Conversion {
    /// The unit every input metric must be declared in.
    pub fn source_unit(&self) -> &'static str {
        match self {
            Conversion::FahrenheitToCelsius => UNIT_FAHRENHEIT,
            Conversion::KnotsToMetersPerSecond => UNIT_KNOTS,
            Conversion::InchesToMillimeters => UNIT_INCH,
            Conversion::FeetToMeters => UNIT_FEET,
        }
    }

    pub fn target_unit(&self) -> &'static str {
        match self {
            Conversion::FahrenheitToCelsius => UNIT_CELSIUS,
            Conversion::KnotsToMetersPerSecond => UNIT_METERS_PER_SECOND,
            Conversion::InchesToMillimeters => UNIT_MILLIMETER,
            Conversion::FeetToMeters => UNIT_METER,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Conversion::FahrenheitToCelsius => "_celsius",
            Conversion::KnotsToMetersPerSecond => "_m_per_s",
            Conversion::InchesToMillimeters => "_mm",
            Conversion::FeetToMeters => "_m",
        }
    }

    fn rescale(&self, expr: Expr) -> Expr {
        match self {
            Conversion::FahrenheitToCelsius => (expr - lit(32.0)) * lit(5.0) / lit(9.0),
            Conversion::KnotsToMetersPerSecond => expr * lit(0.514),
            Conversion::InchesToMillimeters => expr * lit(25.4),
            Conversion::FeetToMeters => expr * lit(0.3048),
        }
    }
}

/// Applies one [`Conversion`] to a list of hourly metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    conversion: Conversion,
    metrics: Vec<String>,
}

impl UnitConversion {
    pub fn new<I, S>(conversion: Conversion, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            conversion,
            metrics: metrics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fahrenheit_to_celsius<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Conversion::FahrenheitToCelsius, metrics)
    }

    pub fn knots_to_meters_per_second<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Conversion::KnotsToMetersPerSecond, metrics)
    }

    pub fn inches_to_millimeters<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Conversion::InchesToMillimeters, metrics)
    }

    pub fn feet_to_meters<I, S>(metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Conversion::FeetToMeters, metrics)
    }

    pub fn conversion(&self) -> Conversion {
        self.conversion
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn output_names(&self) -> Vec<String> {
        self.metrics
            .iter()
            .map(|m| converted_name(m, self.conversion.suffix()))
            .collect()
    }

    /// Every metric must be declared in the conversion's source unit; the
    /// error lists all that are not.
    pub fn validate(&self, series: &WeatherSeries) -> Result<(), TransformError> {
        let expected = self.conversion.source_unit();
        let offending: Vec<String> = self
            .metrics
            .iter()
            .filter(|m| series.unit_of(SeriesKind::Hourly, m) != Some(expected))
            .cloned()
            .collect();
        if !offending.is_empty() {
            return Err(TransformError::UnitMismatch {
                expected: expected.to_string(),
                metrics: offending,
            });
        }
        series.require_columns(SeriesKind::Hourly, &self.metrics)
    }

    fn expressions(&self) -> Vec<Expr> {
        self.metrics
            .iter()
            .zip(self.output_names())
            .map(|(metric, name)| {
                self.conversion
                    .rescale(col(metric.as_str()))
                    .round(DECIMALS)
                    .alias(name)
            })
            .collect()
    }
}

impl SeriesTransform for UnitConversion {
    fn key(&self, _series: &WeatherSeries) -> Result<SeriesKind, TransformError> {
        Ok(SeriesKind::Hourly)
    }

    /// `time`, `date` and the converted, renamed metrics.
    fn transform(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError> {
        self.validate(series)?;
        let mut columns = vec![col(COL_TIME), col(COL_DATE)];
        columns.extend(self.expressions());
        Ok(series.hourly_lazy().select(columns))
    }
}

/// Rewrites the hourly table: keeps `time`, `date` and the `passthrough`
/// metrics unchanged and replaces every converted metric by its renamed,
/// rescaled column. Metrics named in neither list are dropped. The unit
/// table follows the rename.
pub fn apply_conversions(
    series: &WeatherSeries,
    conversions: &[UnitConversion],
    passthrough: &[String],
) -> Result<WeatherSeries, TransformError> {
    series.require_columns(SeriesKind::Hourly, passthrough)?;

    let mut columns = vec![col(COL_TIME), col(COL_DATE)];
    let mut units = UnitTable::new();
    for key in [COL_TIME, COL_DATE] {
        if let Some(unit) = series.unit_of(SeriesKind::Hourly, key) {
            units.insert(key.to_string(), unit.to_string());
        }
    }
    for metric in passthrough {
        columns.push(col(metric.as_str()));
        if let Some(unit) = series.unit_of(SeriesKind::Hourly, metric) {
            units.insert(metric.clone(), unit.to_string());
        }
    }
    for conversion in conversions {
        conversion.validate(series)?;
        debug!(
            "Converting {:?} from {} to {}",
            conversion.metrics(),
            conversion.conversion.source_unit(),
            conversion.conversion.target_unit()
        );
        columns.extend(conversion.expressions());
        for name in conversion.output_names() {
            units.insert(name, conversion.conversion.target_unit().to_string());
        }
    }

    let hourly = series.hourly_lazy().select(columns).collect()?;
    Ok(series.with_hourly(hourly, units))
}
