//! The ETL pipeline: fetch one forecast, derive the hourly and daily output
//! tables, and persist both to CSV and SQLite.

use crate::error::{EtlError, EtlStage};
use crate::extract::client::OpenMeteoClient;
use crate::load::csv_writer::write_csv;
use crate::load::error::LoadError;
use crate::load::report::LoadReport;
use crate::load::sqlite_store::load_table;
use crate::transform::error::TransformError;
use crate::transform::formatter::{DaylightHours, IsoTimestamps};
use crate::transform::unit_converter::apply_conversions;
use crate::transform::SeriesTransform;
use crate::types::columns::{COL_DATE, COL_DATE_UNIX, COL_TIME, COL_TIME_UNIX};
use crate::types::config::EtlConfig;
use crate::types::response::OpenMeteoResponse;
use crate::types::weather_series::{SeriesKind, WeatherSeries};
use bon::bon;
use log::{error, info};
use polars::prelude::*;
use std::error::Error;

/// The two tables a run persists.
#[derive(Debug, Clone)]
pub struct EtlTables {
    /// `time_unix` followed by the exported hourly columns.
    pub hourly: DataFrame,
    /// `date_unix` followed by every daily aggregate and derived column.
    pub daily: DataFrame,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlReport {
    pub hourly_rows: usize,
    pub daily_rows: usize,
    pub loads: Vec<LoadReport>,
}

/// Flat summary of a run, successful or not.
///
/// `stage` is [`EtlStage::Done`] on success and the failing stage otherwise;
/// `message` is a human-readable description including the error's causes.
#[derive(Debug, Clone, PartialEq)]
pub struct EtlOutcome {
    pub success: bool,
    pub stage: EtlStage,
    pub message: String,
    pub loads: Vec<LoadReport>,
}

/// Runs the configured pipeline.
///
/// ```no_run
/// use open_meteo_etl::{EtlConfig, OpenMeteoEtl};
///
/// # #[tokio::main]
/// # async fn main() {
/// let etl = OpenMeteoEtl::builder().config(EtlConfig::default()).build();
/// let outcome = etl.run().await;
/// println!("{}: {}", outcome.stage, outcome.message);
/// # }
/// ```
pub struct OpenMeteoEtl {
    config: EtlConfig,
    client: OpenMeteoClient,
}

#[bon]
impl OpenMeteoEtl {
    /// Creates a pipeline. Both arguments are optional: the default
    /// configuration reproduces the Novosibirsk run, the default client is a
    /// fresh `reqwest` client.
    #[builder]
    pub fn new(
        #[builder(default)] config: EtlConfig,
        #[builder(default)] client: OpenMeteoClient,
    ) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Derives both output tables from one raw response. Pure: nothing is
    /// read from or written to the outside world.
    ///
    /// Order of steps: normalize time, convert units, then per-day
    /// aggregates, daylight hours and ISO timestamps. Daily-keyed outputs are
    /// left-joined onto the response's list of days, so a day for which a
    /// step produced nothing still appears with nulls.
    pub fn transform(&self, response: OpenMeteoResponse) -> Result<EtlTables, TransformError> {
        let plan = &self.config.plan;
        let series = WeatherSeries::from_response(response, plan.offset_rule)?;
        info!(
            "Normalized {} hourly and {} daily rows",
            series.hourly().height(),
            series.daily().height()
        );
        let series = apply_conversions(&series, &plan.conversions, &plan.passthrough)?;

        let mut steps: Vec<Box<dyn SeriesTransform>> = plan
            .aggregations
            .iter()
            .cloned()
            .map(|a| Box::new(a) as Box<dyn SeriesTransform>)
            .collect();
        if plan.daylight_hours {
            steps.push(Box::new(DaylightHours));
        }
        if !plan.iso_columns.is_empty() {
            steps.push(Box::new(IsoTimestamps::new(plan.iso_columns.iter().cloned())));
        }

        let kept: Vec<Expr> = series
            .hourly()
            .get_column_names_str()
            .into_iter()
            .filter(|name| {
                *name != COL_DATE && !plan.hourly_exclusions.iter().any(|e| e.as_str() == *name)
            })
            .map(col)
            .collect();
        let mut hourly = series.hourly_lazy().select(kept);
        let mut daily = series.daily_lazy().select([col(COL_DATE)]);

        for step in &steps {
            let output = step.transform(&series)?;
            match step.key(&series)? {
                SeriesKind::Hourly => {
                    hourly = hourly.left_join(output, col(COL_TIME), col(COL_TIME));
                }
                SeriesKind::Daily => {
                    daily = daily.left_join(output, col(COL_DATE), col(COL_DATE));
                }
            }
        }

        let mut hourly = hourly
            .sort([COL_TIME], SortMultipleOptions::default())
            .collect()?;
        hourly.rename(COL_TIME, COL_TIME_UNIX.into())?;
        let mut daily = daily
            .sort([COL_DATE], SortMultipleOptions::default())
            .collect()?;
        daily.rename(COL_DATE, COL_DATE_UNIX.into())?;

        info!(
            "Built hourly table {:?} and daily table {:?}",
            hourly.shape(),
            daily.shape()
        );
        Ok(EtlTables { hourly, daily })
    }

    /// Writes the CSV files (hourly, then daily), then both database tables.
    ///
    /// Every output is attempted even if an earlier one fails. If any fail,
    /// the error is [`LoadError::Incomplete`], carrying the reports of the
    /// tables that were loaded and the first failure.
    pub async fn load(&self, tables: &EtlTables) -> Result<Vec<LoadReport>, LoadError> {
        let output = &self.config.output;
        let mut failures = Vec::new();

        for (df, path) in [
            (&tables.hourly, &output.hourly_csv),
            (&tables.daily, &output.daily_csv),
        ] {
            if let Err(e) = write_csv(df.clone(), path).await {
                error!("Writing {} failed: {}", path.display(), e);
                failures.push(e);
            }
        }

        let mut reports = Vec::with_capacity(2);
        for (df, target) in [
            (&tables.hourly, &output.hourly_table),
            (&tables.daily, &output.daily_table),
        ] {
            match load_table(
                &output.database,
                df.clone(),
                target.clone(),
                output.conflict_resolution,
            )
            .await
            {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Loading table '{}' failed: {}", target.table, e);
                    failures.push(e);
                }
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(reports),
            Some(first) => Err(LoadError::Incomplete {
                completed: reports,
                failed,
                source: Box::new(first),
            }),
        }
    }

    /// Fetch, transform and load, stopping at the first failing stage.
    pub async fn try_run(&self) -> Result<EtlReport, EtlError> {
        let response = self.client.fetch(&self.config.request).await?;
        let tables = self.transform(response)?;
        let loads = self.load(&tables).await?;
        Ok(EtlReport {
            hourly_rows: tables.hourly.height(),
            daily_rows: tables.daily.height(),
            loads,
        })
    }

    /// Like [`OpenMeteoEtl::try_run`], but never fails: the outcome reports
    /// whether the run succeeded and, if not, in which stage. Tables loaded
    /// before a load failure are still listed in `loads`.
    pub async fn run(&self) -> EtlOutcome {
        match self.try_run().await {
            Ok(report) => {
                let message = format!(
                    "Loaded {} hourly and {} daily rows",
                    report.hourly_rows, report.daily_rows
                );
                info!("{}", message);
                EtlOutcome {
                    success: true,
                    stage: EtlStage::Done,
                    message,
                    loads: report.loads,
                }
            }
            Err(e) => {
                let message = error_chain(&e);
                error!("ETL failed during {}: {}", e.stage(), message);
                EtlOutcome {
                    success: false,
                    stage: e.stage(),
                    message,
                    loads: e.completed_loads().to_vec(),
                }
            }
        }
    }
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
