mod error;
mod extract;
mod load;
mod open_meteo_etl;
mod transform;
mod types;
mod utils;

#[cfg(test)]
mod test_support;

pub use error::{EtlError, EtlStage};
pub use open_meteo_etl::*;

pub use extract::client::OpenMeteoClient;
pub use extract::error::FetchError;

pub use transform::aggregator::{Aggregation, Statistic, Window};
pub use transform::error::TransformError;
pub use transform::formatter::{DaylightHours, IsoTimestamps};
pub use transform::naming;
pub use transform::time_normalizer::{OffsetRule, TimeEncoding, TimeNormalizer};
pub use transform::unit_converter::{apply_conversions, Conversion, UnitConversion};
pub use transform::SeriesTransform;

pub use load::csv_writer::write_csv;
pub use load::error::LoadError;
pub use load::report::{ConflictResolution, LoadReport, RowFailure};
pub use load::sqlite_store::{load_table, SqliteStore};

pub use types::columns::*;
pub use types::config::{EtlConfig, ForecastRequest, OutputTargets, TableTarget, TransformPlan};
pub use types::response::{OpenMeteoResponse, RawBlock, UnitTable};
pub use types::weather_series::{SeriesKind, WeatherSeries};
