//! The transformation core: time normalization, unit conversion, per-day
//! aggregation and formatting. Every step reads a [`WeatherSeries`] and
//! returns a new lazy table keyed by `time` or `date`.

pub mod aggregator;
pub mod error;
pub mod formatter;
pub mod naming;
pub mod time_normalizer;
pub mod unit_converter;

use crate::transform::error::TransformError;
use crate::types::weather_series::{SeriesKind, WeatherSeries};
use polars::prelude::LazyFrame;

/// A pure step of the pipeline.
///
/// Implementors never mutate the input series; the returned frame holds the
/// output key column ([`SeriesTransform::key`]) followed by the derived
/// columns, and can be joined onto other outputs with the same key.
pub trait SeriesTransform {
    /// Which table's key the output is indexed by.
    fn key(&self, series: &WeatherSeries) -> Result<SeriesKind, TransformError>;

    fn transform(&self, series: &WeatherSeries) -> Result<LazyFrame, TransformError>;
}
