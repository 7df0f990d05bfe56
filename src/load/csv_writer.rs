use crate::load::error::LoadError;
use crate::utils::ensure_parent_dir_exists;
use log::info;
use polars::prelude::*;
use std::path::Path;
use tokio::task;

/// Writes `df` to `path` as comma-separated text with a header row, creating
/// the parent directory if needed. Nulls become empty fields.
///
/// The write itself runs on the blocking pool.
pub async fn write_csv(df: DataFrame, path: &Path) -> Result<(), LoadError> {
    ensure_parent_dir_exists(path).await?;
    let path_buf = path.to_path_buf();
    let rows = df.height();
    task::spawn_blocking(move || write_csv_blocking(df, &path_buf))
        .await??;
    info!("Saved {} rows to {}", rows, path.display());
    Ok(())
}

fn write_csv_blocking(mut df: DataFrame, path: &Path) -> Result<(), LoadError> {
    let file = std::fs::File::create(path)
        .map_err(|e| LoadError::CsvWriteIo(path.to_path_buf(), e))?;
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)
        .map_err(|e| LoadError::CsvWritePolars(path.to_path_buf(), e))
}
