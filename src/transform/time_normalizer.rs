//! Converts the raw `time`/`sunrise`/`sunset` sequences of a payload into
//! local-adjusted epoch seconds and derives the calendar-day bucket of
//! every hourly sample.

use crate::transform::error::TransformError;
use crate::types::columns::{SECONDS_PER_DAY, UNIT_ISO8601, UNIT_UNIXTIME};
use crate::types::response::OpenMeteoResponse;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

const ISO_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// How the payload's `utc_offset_seconds` is applied to `unixtime` columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OffsetRule {
    /// The offset is added when the timezone abbreviation contains `+`
    /// and subtracted otherwise. Abbreviations without an explicit sign
    /// (`CEST`, `GMT`) therefore take the subtraction branch.
    #[default]
    AbbreviationSign,
    /// The signed offset is always added.
    SignedOffset,
}

/// How a column's values are encoded, taken from its declared unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeEncoding {
    /// Integer seconds since epoch, UTC.
    UnixTime,
    /// Calendar strings, already in local wall-clock time.
    Calendar,
}

impl TimeEncoding {
    /// Returns `None` for units that do not describe a timestamp.
    pub fn from_unit(unit: &str) -> Option<Self> {
        match unit {
            UNIT_UNIXTIME => Some(TimeEncoding::UnixTime),
            UNIT_ISO8601 => Some(TimeEncoding::Calendar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    /// Signed shift applied to every `unixtime` value.
    shift_seconds: i64,
}

impl TimeNormalizer {
    pub fn new(utc_offset_seconds: i64, timezone_abbreviation: &str, rule: OffsetRule) -> Self {
        let shift_seconds = match rule {
            OffsetRule::AbbreviationSign if timezone_abbreviation.contains('+') => {
                utc_offset_seconds
            }
            OffsetRule::AbbreviationSign => -utc_offset_seconds,
            OffsetRule::SignedOffset => utc_offset_seconds,
        };
        Self { shift_seconds }
    }

    pub fn for_response(response: &OpenMeteoResponse, rule: OffsetRule) -> Self {
        Self::new(
            response.utc_offset_seconds,
            &response.timezone_abbreviation,
            rule,
        )
    }

    pub fn shift_seconds(&self) -> i64 {
        self.shift_seconds
    }

    /// Local-adjusts a single UTC epoch value.
    pub fn localize(&self, utc_seconds: i64) -> i64 {
        utc_seconds + self.shift_seconds
    }

    /// Local midnight of a local-adjusted timestamp, in the same unit.
    pub fn day_bucket(local_seconds: i64) -> i64 {
        local_seconds - local_seconds.rem_euclid(SECONDS_PER_DAY)
    }

    /// Decodes one raw timestamp column into local-adjusted epoch seconds.
    /// `null` entries stay `None`; anything else unreadable is an error.
    pub fn normalize_column(
        &self,
        column: &str,
        values: &[Value],
        encoding: TimeEncoding,
    ) -> Result<Vec<Option<i64>>, TransformError> {
        values
            .iter()
            .map(|value| match value {
                Value::Null => Ok(None),
                Value::Number(n) if encoding == TimeEncoding::UnixTime => n
                    .as_i64()
                    .map(|utc| Some(self.localize(utc)))
                    .ok_or_else(|| invalid_timestamp(column, value)),
                Value::String(s) if encoding == TimeEncoding::Calendar => parse_calendar(s)
                    .map(Some)
                    .ok_or_else(|| invalid_timestamp(column, value)),
                _ => Err(invalid_timestamp(column, value)),
            })
            .collect()
    }

    /// Like [`Self::normalize_column`] but every entry must be present, as
    /// required for the `time` key of a block.
    pub fn normalize_key_column(
        &self,
        column: &str,
        values: &[Value],
        encoding: TimeEncoding,
    ) -> Result<Vec<i64>, TransformError> {
        self.normalize_column(column, values, encoding)?
            .into_iter()
            .zip(values)
            .map(|(ts, raw)| ts.ok_or_else(|| invalid_timestamp(column, raw)))
            .collect()
    }
}

/// Calendar strings carry no zone; they are read as wall-clock seconds.
fn parse_calendar(text: &str) -> Option<i64> {
    ISO_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc().timestamp())
}

fn invalid_timestamp(column: &str, value: &Value) -> TransformError {
    TransformError::InvalidTimestamp {
        column: column.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plus_sign_adds_offset() {
        let normalizer = TimeNormalizer::new(25200, "GMT+7", OffsetRule::AbbreviationSign);
        assert_eq!(normalizer.localize(1748365200), 1748390400);
    }

    #[test]
    fn test_unsigned_abbreviation_subtracts_offset() {
        // Positive offset without a '+' in the abbreviation still subtracts.
        let normalizer = TimeNormalizer::new(7200, "CEST", OffsetRule::AbbreviationSign);
        assert_eq!(normalizer.localize(10_000), 2_800);

        let negative = TimeNormalizer::new(-18000, "GMT-5", OffsetRule::AbbreviationSign);
        assert_eq!(negative.localize(0), 18000);
    }

    #[test]
    fn test_signed_offset_rule() {
        let normalizer = TimeNormalizer::new(-18000, "GMT-5", OffsetRule::SignedOffset);
        assert_eq!(normalizer.localize(18000), 0);
        let cest = TimeNormalizer::new(7200, "CEST", OffsetRule::SignedOffset);
        assert_eq!(cest.shift_seconds(), 7200);
    }

    #[test]
    fn test_day_bucket_is_local_midnight() {
        assert_eq!(TimeNormalizer::day_bucket(1748390400), 1748390400);
        assert_eq!(TimeNormalizer::day_bucket(1748390400 + 23 * 3600), 1748390400);
        assert_eq!(TimeNormalizer::day_bucket(1748390400 + 24 * 3600), 1748476800);
        assert_eq!(TimeNormalizer::day_bucket(-1), -86400);
    }

    #[test]
    fn test_normalize_unixtime_column_keeps_nulls() -> Result<(), TransformError> {
        let normalizer = TimeNormalizer::new(3600, "GMT+1", OffsetRule::AbbreviationSign);
        let values = vec![json!(0), Value::Null, json!(7200)];
        let out = normalizer.normalize_column("sunrise", &values, TimeEncoding::UnixTime)?;
        assert_eq!(out, vec![Some(3600), None, Some(10800)]);
        Ok(())
    }

    #[test]
    fn test_calendar_strings_are_not_shifted() -> Result<(), TransformError> {
        let normalizer = TimeNormalizer::new(25200, "GMT+7", OffsetRule::AbbreviationSign);
        let values = vec![json!("2025-05-28T00:00"), json!("2025-05-28")];
        let out = normalizer.normalize_column("time", &values, TimeEncoding::Calendar)?;
        assert_eq!(out, vec![Some(1748390400), Some(1748390400)]);
        Ok(())
    }

    #[test]
    fn test_key_column_rejects_null_and_garbage() {
        let normalizer = TimeNormalizer::new(0, "GMT", OffsetRule::AbbreviationSign);
        let with_null = vec![json!(1), Value::Null];
        assert!(matches!(
            normalizer.normalize_key_column("time", &with_null, TimeEncoding::UnixTime),
            Err(TransformError::InvalidTimestamp { .. })
        ));
        let garbage = vec![json!("yesterday")];
        assert!(matches!(
            normalizer.normalize_column("time", &garbage, TimeEncoding::Calendar),
            Err(TransformError::InvalidTimestamp { .. })
        ));
    }
}
