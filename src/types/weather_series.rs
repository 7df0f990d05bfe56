//! The in-memory working set threaded through every transformation: one
//! hourly and one daily table, each with the declared unit of its columns.

use crate::transform::error::TransformError;
use crate::transform::time_normalizer::{OffsetRule, TimeEncoding, TimeNormalizer};
use crate::types::columns::{COL_DATE, COL_TIME};
use crate::types::response::{OpenMeteoResponse, RawBlock, UnitTable};
use log::debug;
use polars::prelude::*;
use serde_json::Value;

/// Which of the two tables a column lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Hourly,
    Daily,
}

impl SeriesKind {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesKind::Hourly => "hourly",
            SeriesKind::Daily => "daily",
        }
    }

    /// Primary key of the table.
    pub fn key(&self) -> &'static str {
        match self {
            SeriesKind::Hourly => COL_TIME,
            SeriesKind::Daily => COL_DATE,
        }
    }
}

/// Hourly and daily series of one forecast response.
///
/// The hourly table holds `time` (local-adjusted epoch seconds), `date`
/// (local midnight of `time`) and one `f64` column per metric. The daily
/// table holds `date` plus its own columns, with `unixtime`/`iso8601`
/// columns such as `sunrise` and `sunset` stored as local-adjusted `i64`.
///
/// Instances are immutable: every transformation reads from a series and
/// produces new frames.
#[derive(Debug, Clone)]
pub struct WeatherSeries {
    latitude: f64,
    longitude: f64,
    hourly: DataFrame,
    daily: DataFrame,
    hourly_units: UnitTable,
    daily_units: UnitTable,
}

impl WeatherSeries {
    /// Consumes a raw response and builds the two normalized tables.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Schema`] if a unit table, a series block or
    /// its `time` column is absent, [`TransformError::MisalignedSeries`] if a
    /// column is not index-aligned with `time`, and
    /// [`TransformError::InvalidTimestamp`] / [`TransformError::InvalidValue`]
    /// for unreadable entries.
    pub fn from_response(
        response: OpenMeteoResponse,
        rule: OffsetRule,
    ) -> Result<Self, TransformError> {
        let normalizer = TimeNormalizer::for_response(&response, rule);
        debug!(
            "Normalizing series for ({}, {}) with a shift of {}s",
            response.latitude,
            response.longitude,
            normalizer.shift_seconds()
        );

        let hourly_units = response
            .hourly_units
            .ok_or_else(|| TransformError::schema("hourly_units"))?;
        let daily_units = response
            .daily_units
            .ok_or_else(|| TransformError::schema("daily_units"))?;
        let hourly_block = response
            .hourly
            .ok_or_else(|| TransformError::schema("hourly"))?;
        let daily_block = response
            .daily
            .ok_or_else(|| TransformError::schema("daily"))?;

        let hourly = build_table(SeriesKind::Hourly, &hourly_block, &hourly_units, &normalizer)?;
        let daily = build_table(SeriesKind::Daily, &daily_block, &daily_units, &normalizer)?;

        // The daily `time` column is exposed as `date`.
        let mut daily_units = daily_units;
        if let Some(unit) = daily_units.remove(COL_TIME) {
            daily_units.insert(COL_DATE.to_string(), unit);
        }

        Ok(Self {
            latitude: response.latitude,
            longitude: response.longitude,
            hourly,
            daily,
            hourly_units,
            daily_units,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn hourly(&self) -> &DataFrame {
        &self.hourly
    }

    pub fn daily(&self) -> &DataFrame {
        &self.daily
    }

    pub fn hourly_lazy(&self) -> LazyFrame {
        self.hourly.clone().lazy()
    }

    pub fn daily_lazy(&self) -> LazyFrame {
        self.daily.clone().lazy()
    }

    pub fn units(&self, kind: SeriesKind) -> &UnitTable {
        match kind {
            SeriesKind::Hourly => &self.hourly_units,
            SeriesKind::Daily => &self.daily_units,
        }
    }

    pub fn unit_of(&self, kind: SeriesKind, column: &str) -> Option<&str> {
        self.units(kind).get(column).map(String::as_str)
    }

    pub fn frame(&self, kind: SeriesKind) -> &DataFrame {
        match kind {
            SeriesKind::Hourly => &self.hourly,
            SeriesKind::Daily => &self.daily,
        }
    }

    /// Fails with [`TransformError::MissingColumn`] on the first absent column.
    pub fn require_columns<S: AsRef<str>>(
        &self,
        kind: SeriesKind,
        columns: &[S],
    ) -> Result<(), TransformError> {
        let frame = self.frame(kind);
        match columns
            .iter()
            .map(AsRef::as_ref)
            .find(|c| frame.column(c).is_err())
        {
            Some(missing) => Err(TransformError::MissingColumn {
                table: kind.name().to_string(),
                column: missing.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Returns a series whose hourly table is replaced by `hourly`, keeping
    /// the daily table.
    pub fn with_hourly(&self, hourly: DataFrame, hourly_units: UnitTable) -> Self {
        Self {
            hourly,
            hourly_units,
            ..self.clone()
        }
    }
}

fn build_table(
    kind: SeriesKind,
    block: &RawBlock,
    units: &UnitTable,
    normalizer: &TimeNormalizer,
) -> Result<DataFrame, TransformError> {
    let time_field = format!("{}.{}", kind.name(), COL_TIME);
    let raw_time = block
        .get(COL_TIME)
        .and_then(Value::as_array)
        .ok_or_else(|| TransformError::schema(&time_field))?;
    let time_unit = units
        .get(COL_TIME)
        .ok_or_else(|| TransformError::schema(format!("{}_units.{}", kind.name(), COL_TIME)))?;
    let time_encoding =
        TimeEncoding::from_unit(time_unit).ok_or_else(|| TransformError::UnitMismatch {
            expected: "unixtime or iso8601".to_string(),
            metrics: vec![time_field.clone()],
        })?;

    let times = normalizer.normalize_key_column(COL_TIME, raw_time, time_encoding)?;
    let expected = times.len();

    let mut columns = Vec::with_capacity(block.columns.len() + 1);
    match kind {
        SeriesKind::Hourly => {
            let dates: Vec<i64> = times.iter().copied().map(TimeNormalizer::day_bucket).collect();
            columns.push(Column::new(COL_TIME.into(), times));
            columns.push(Column::new(COL_DATE.into(), dates));
        }
        SeriesKind::Daily => columns.push(Column::new(COL_DATE.into(), times)),
    }

    for name in block.names().filter(|n| *n != COL_TIME) {
        let values = block
            .get(name)
            .and_then(Value::as_array)
            .ok_or_else(|| TransformError::InvalidValue {
                column: name.to_string(),
                value: "not an array".to_string(),
            })?;
        if values.len() != expected {
            return Err(TransformError::MisalignedSeries {
                metric: name.to_string(),
                expected,
                found: values.len(),
            });
        }

        let column = match units.get(name).and_then(|u| TimeEncoding::from_unit(u)) {
            Some(encoding) => Column::new(
                name.into(),
                normalizer.normalize_column(name, values, encoding)?,
            ),
            None => Column::new(name.into(), numeric_values(name, values)?),
        };
        columns.push(column);
    }

    Ok(DataFrame::new(columns)?)
}

fn numeric_values(column: &str, values: &[Value]) -> Result<Vec<Option<f64>>, TransformError> {
    values
        .iter()
        .map(|value| match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(n.as_f64()),
            other => Err(TransformError::InvalidValue {
                column: column.to_string(),
                value: other.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_response, fixture_series};
    use serde_json::json;

    #[test]
    fn test_fixture_tables_shape() -> Result<(), Box<dyn std::error::Error>> {
        let series = fixture_series()?;
        assert_eq!(series.hourly().height(), 72);
        assert_eq!(series.daily().height(), 3);
        assert_eq!(series.hourly().column(COL_TIME)?.dtype(), &DataType::Int64);
        assert_eq!(
            series.hourly().column("temperature_2m")?.dtype(),
            &DataType::Float64
        );
        // Relative humidity is integral in the payload but numeric in the table.
        assert_eq!(
            series.hourly().column("relative_humidity_2m")?.dtype(),
            &DataType::Float64
        );
        assert_eq!(series.daily().column("sunrise")?.dtype(), &DataType::Int64);
        Ok(())
    }

    #[test]
    fn test_date_equals_local_midnight_of_time() -> Result<(), Box<dyn std::error::Error>> {
        let series = fixture_series()?;
        let times = series.hourly().column(COL_TIME)?.i64()?;
        let dates = series.hourly().column(COL_DATE)?.i64()?;
        for (time, date) in times.into_iter().zip(dates.into_iter()) {
            let (time, date) = (time.ok_or("null time")?, date.ok_or("null date")?);
            assert_eq!(date, time - time.rem_euclid(86400));
        }
        assert_eq!(times.get(0), Some(1748365200 + 25200));
        assert_eq!(dates.get(0), Some(1748390400));
        assert_eq!(dates.get(71), Some(1748563200));
        Ok(())
    }

    #[test]
    fn test_daily_date_and_bounds_are_localized() -> Result<(), Box<dyn std::error::Error>> {
        let series = fixture_series()?;
        let dates = series.daily().column(COL_DATE)?.i64()?;
        let sunrise = series.daily().column("sunrise")?.i64()?;
        assert_eq!(dates.get(0), Some(1748390400));
        assert_eq!(sunrise.get(0), Some(1748383239 + 25200));
        assert_eq!(series.unit_of(SeriesKind::Daily, COL_DATE), Some("unixtime"));
        assert_eq!(series.unit_of(SeriesKind::Daily, COL_TIME), None);
        Ok(())
    }

    #[test]
    fn test_missing_unit_tables_are_schema_errors() -> Result<(), Box<dyn std::error::Error>> {
        let mut response = fixture_response()?;
        response.hourly_units = None;
        let err = WeatherSeries::from_response(response, OffsetRule::default()).unwrap_err();
        assert!(matches!(err, TransformError::Schema { field } if field == "hourly_units"));

        let mut response = fixture_response()?;
        response.daily_units = None;
        let err = WeatherSeries::from_response(response, OffsetRule::default()).unwrap_err();
        assert!(matches!(err, TransformError::Schema { field } if field == "daily_units"));
        Ok(())
    }

    #[test]
    fn test_misaligned_metric_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut response = fixture_response()?;
        if let Some(hourly) = response.hourly.as_mut() {
            hourly
                .columns
                .insert("snowfall".to_string(), json!([0.0, 0.1]));
        }
        let err = WeatherSeries::from_response(response, OffsetRule::default()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::MisalignedSeries {
                ref metric,
                expected: 72,
                found: 2,
            } if metric == "snowfall"
        ));
        Ok(())
    }

    #[test]
    fn test_require_columns_names_the_missing_one() -> Result<(), Box<dyn std::error::Error>> {
        let series = fixture_series()?;
        assert!(series
            .require_columns(SeriesKind::Hourly, &["temperature_2m", "snowfall"])
            .is_ok());
        let err = series
            .require_columns(SeriesKind::Hourly, &["temperature_2m", "rain"])
            .unwrap_err();
        assert!(matches!(
            err,
            TransformError::MissingColumn { ref column, .. } if column == "rain"
        ));
        Ok(())
    }
}
