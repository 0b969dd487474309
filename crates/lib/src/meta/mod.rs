//! Package metadata written into the stripped tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::consts::{META_DIR, META_FILENAME};
use crate::project::ProjectMetadata;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("invalid metadata in {}: {source}", path.display())]
  Format { path: PathBuf, source: serde_yaml::Error },
}

/// Generates the package manifest once a full-project run reaches `strip`.
pub trait ManifestGenerator {
  fn generate(&self, metadata: &ProjectMetadata, strip_dir: &Path) -> Result<PathBuf, ManifestError>;
}

/// Writes `meta/package.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaYaml;

impl ManifestGenerator for MetaYaml {
  fn generate(&self, metadata: &ProjectMetadata, strip_dir: &Path) -> Result<PathBuf, ManifestError> {
    let dir = strip_dir.join(META_DIR);
    let path = dir.join(META_FILENAME);
    let content = serde_yaml::to_string(metadata).map_err(|e| ManifestError::Format {
      path: path.clone(),
      source: e,
    })?;

    fs::create_dir_all(&dir).map_err(|e| ManifestError::Write {
      path: dir.clone(),
      source: e,
    })?;
    fs::write(&path, content).map_err(|e| ManifestError::Write {
      path: path.clone(),
      source: e,
    })?;

    info!(path = %path.display(), "wrote package metadata");
    Ok(path)
  }
}

/// Read metadata from a tree previously produced by [`MetaYaml`].
pub fn read(tree: &Path) -> Result<ProjectMetadata, ManifestError> {
  let path = tree.join(META_DIR).join(META_FILENAME);
  let content = fs::read_to_string(&path).map_err(|e| ManifestError::Read {
    path: path.clone(),
    source: e,
  })?;
  serde_yaml::from_str(&content).map_err(|e| ManifestError::Format { path, source: e })
}
