use crate::load::error::LoadError;
use log::info;
use std::io;
use std::path::Path;

/// Creates the directory that will hold `file`, if it has one and it is
/// missing.
pub async fn ensure_parent_dir_exists(file: &Path) -> Result<(), LoadError> {
    let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    match tokio::fs::metadata(dir).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(LoadError::NotADirectory(dir.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating output directory: {}", dir.display());
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| LoadError::DirCreation(dir.to_path_buf(), e))
        }
        Err(e) => Err(LoadError::DirCreation(dir.to_path_buf(), e)),
    }
}
