use std::path::PathBuf;

use crate::consts::PROJECT_DIR_ENV;

/// Returns the project directory.
///
/// `SNAPFORGE_PROJECT_DIR` wins over the current working directory.
pub fn project_dir() -> std::io::Result<PathBuf> {
  match std::env::var_os(PROJECT_DIR_ENV) {
    Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
    _ => std::env::current_dir(),
  }
}
