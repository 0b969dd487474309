//! Packaging the stripped tree into a compressed filesystem image.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;
use tracing::info;

use crate::consts::IMAGE_EXTENSION;
use crate::lifecycle::{self, Collaborators, LifecycleError};
use crate::meta::{self, ManifestError};
use crate::project::{PackageType, Project, ProjectMetadata};
use crate::step::Step;

#[derive(Debug, Error)]
pub enum PackError {
  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("{} is not a directory", path.display())]
  NotADirectory { path: PathBuf },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: io::Error },

  #[error("'{0}' not found on PATH")]
  CompressorMissing(String),

  #[error("failed to run {tool}: {source}")]
  Spawn { tool: String, source: io::Error },

  #[error("{tool} failed with exit code {code:?}")]
  CompressorFailed { tool: String, code: Option<i32> },
}

/// Compressor flags for a package of `package_type`.
///
/// Extended attributes are always dropped and the output is never appended
/// to. Every type except `os` gets its files owned by root.
pub fn squashfs_flags(package_type: PackageType) -> Vec<&'static str> {
  let mut flags = vec!["-noappend", "-comp", "xz", "-no-xattrs"];
  if package_type != PackageType::Os {
    flags.push("-all-root");
  }
  flags
}

/// `<name>_<version>_<arch>.snap`, with `multi` for several architectures.
pub fn image_name(metadata: &ProjectMetadata) -> String {
  let arch = match metadata.architectures.as_slice() {
    [single] => single.as_str(),
    _ => "multi",
  };
  format!("{}_{}_{}.{}", metadata.name, metadata.version, arch, IMAGE_EXTENSION)
}

pub trait ImageCompressor {
  fn compress(&self, source: &Path, output: &Path, flags: &[&str]) -> Result<(), PackError>;
}

/// `mksquashfs` from squashfs-tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mksquashfs;

impl ImageCompressor for Mksquashfs {
  fn compress(&self, source: &Path, output: &Path, flags: &[&str]) -> Result<(), PackError> {
    let tool = "mksquashfs";
    let binary = which::which(tool).map_err(|_| PackError::CompressorMissing(tool.to_string()))?;

    let status = Command::new(binary)
      .arg(source)
      .arg(output)
      .args(flags)
      .status()
      .map_err(|e| PackError::Spawn {
        tool: tool.to_string(),
        source: e,
      })?;
    if !status.success() {
      return Err(PackError::CompressorFailed {
        tool: tool.to_string(),
        code: status.code(),
      });
    }
    Ok(())
  }
}

/// Pack `tree` into `output`, or into the default image name under `out_dir`.
pub fn pack_tree(
  tree: &Path,
  metadata: &ProjectMetadata,
  output: Option<&Path>,
  out_dir: &Path,
  compressor: &dyn ImageCompressor,
) -> Result<PathBuf, PackError> {
  let image = output.map(Path::to_path_buf).unwrap_or_else(|| out_dir.join(image_name(metadata)));
  info!(image = %image.display(), "snapping");
  compressor.compress(tree, &image, &squashfs_flags(metadata.package_type))?;
  info!(image = %image.display(), "snapped");
  Ok(image)
}

/// Run the whole lifecycle through `strip`, then pack the stripped tree.
pub fn snap(
  project: &Project,
  output: Option<&Path>,
  collaborators: &Collaborators,
  compressor: &dyn ImageCompressor,
) -> Result<PathBuf, PackError> {
  let no_parts: &[&str] = &[];
  lifecycle::execute(Step::Strip, project, no_parts, collaborators)?;

  let paths = project.paths();
  pack_tree(&paths.strip_dir(), project.metadata(), output, paths.root(), compressor)
}

/// Pack an existing tree, reading its metadata from `meta/package.yaml`.
pub fn snap_directory(
  directory: &Path,
  output: Option<&Path>,
  out_dir: &Path,
  compressor: &dyn ImageCompressor,
) -> Result<PathBuf, PackError> {
  if !directory.is_dir() {
    return Err(PackError::NotADirectory {
      path: directory.to_path_buf(),
    });
  }
  let tree = dunce::canonicalize(directory).map_err(|e| PackError::Canonicalize {
    path: directory.to_path_buf(),
    source: e,
  })?;
  let metadata = meta::read(&tree)?;
  pack_tree(&tree, &metadata, output, out_dir, compressor)
}
