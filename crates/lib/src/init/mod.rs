//! Initialize a new snapforge project.
//!
//! Writes a template `snapforge.yaml` into the project directory. An existing
//! project file is never touched.

mod templates;

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::project::ProjectPaths;

pub use templates::PROJECT_TEMPLATE;

/// Errors that can occur during initialization.
#[derive(Debug, Error)]
pub enum InitError {
  #[error("{} already exists", path.display())]
  AlreadyExists { path: PathBuf },

  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: std::io::Error },
}

/// Create `snapforge.yaml` in the project root.
///
/// # Errors
///
/// Returns `AlreadyExists` without writing anything if the file is present.
pub fn init(paths: &ProjectPaths) -> Result<PathBuf, InitError> {
  let config_file = paths.config_file();
  if config_file.exists() {
    return Err(InitError::AlreadyExists { path: config_file });
  }

  fs::create_dir_all(paths.root()).map_err(|e| InitError::CreateDir {
    path: paths.root().to_path_buf(),
    source: e,
  })?;
  fs::write(&config_file, PROJECT_TEMPLATE).map_err(|e| InitError::WriteFile {
    path: config_file.clone(),
    source: e,
  })?;

  info!(path = %config_file.display(), "created project file");
  Ok(config_file)
}
