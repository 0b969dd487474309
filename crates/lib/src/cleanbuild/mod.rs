//! Building the package inside a fresh container.
//!
//! The project directory is archived without any build output and handed to
//! a [`CleanBuilder`], which runs `snapforge snap` somewhere pristine and
//! brings the image back.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use flate2::Compression;
use flate2::write::GzEncoder;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::{APP_NAME, IMAGE_EXTENSION, LOCAL_PLUGINS_DIR, PARTS_DIR, STAGE_DIR, STRIP_DIR};
use crate::pack::image_name;
use crate::project::{Project, ProjectMetadata};
use crate::util::hash::relative_key;

#[derive(Debug, Error)]
pub enum CleanbuildError {
  #[error("the lxd client 'lxc' is not installed; install lxd to use cleanbuild")]
  LxdMissing,

  #[error("failed to create source archive {}: {source}", path.display())]
  Archive { path: PathBuf, source: io::Error },

  #[error("failed to run {cmd}: {source}")]
  Spawn { cmd: String, source: io::Error },

  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed { cmd: String, code: Option<i32> },
}

/// Builds an image from a source archive in an isolated environment.
pub trait CleanBuilder {
  /// Fail early when the backend cannot run on this host.
  fn check(&self) -> Result<(), CleanbuildError> {
    Ok(())
  }

  /// Build `image` from `tarball` and place it in `out_dir`.
  fn build(&self, tarball: &Path, image: &str, out_dir: &Path) -> Result<PathBuf, CleanbuildError>;
}

/// `<name>_<version>_source.tar.gz`
pub fn tarball_name(metadata: &ProjectMetadata) -> String {
  format!("{}_{}_source.tar.gz", metadata.name, metadata.version)
}

/// Whether a project-relative path belongs in the source archive.
fn is_source(rel: &str, tarball: &str) -> bool {
  let mut components = rel.split('/');
  let first = components.next().unwrap_or_default();

  if first == PARTS_DIR {
    return match components.next() {
      None => true,
      Some(second) => second == LOCAL_PLUGINS_DIR,
    };
  }
  if rel == STAGE_DIR || rel == STRIP_DIR || rel == tarball {
    return false;
  }
  !rel.ends_with(&format!(".{}", IMAGE_EXTENSION))
}

/// Archive the project root into `tarball`, leaving out build output.
pub fn create_tarball(root: &Path, tarball: &Path) -> Result<(), CleanbuildError> {
  let archive_err = |e: io::Error| CleanbuildError::Archive {
    path: tarball.to_path_buf(),
    source: e,
  };
  let tarball_name = tarball
    .file_name()
    .map(|n| n.to_string_lossy().to_string())
    .unwrap_or_default();

  let file = File::create(tarball).map_err(archive_err)?;
  let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
  builder.follow_symlinks(false);

  let walker = WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter();
  for entry in walker.filter_entry(|e| relative_key(root, e.path()).is_none_or(|rel| is_source(&rel, &tarball_name))) {
    let entry = entry.map_err(|e| archive_err(io::Error::other(e)))?;
    let Some(rel) = relative_key(root, entry.path()) else {
      continue;
    };
    debug!(path = %rel, "archiving");
    builder.append_path_with_name(entry.path(), &rel).map_err(archive_err)?;
  }

  builder.into_inner().and_then(|gz| gz.finish()).map_err(archive_err)?;
  Ok(())
}

/// Archive the project and build it with `builder`.
pub fn cleanbuild(project: &Project, builder: &dyn CleanBuilder) -> Result<PathBuf, CleanbuildError> {
  builder.check()?;

  let root = project.paths().root();
  let tarball = root.join(tarball_name(project.metadata()));

  info!(tarball = %tarball.display(), "creating source archive");
  create_tarball(root, &tarball)?;

  builder.build(&tarball, &image_name(project.metadata()), root)
}

/// Builds in an ephemeral LXD container through the `lxc` client.
#[derive(Debug, Clone)]
pub struct LxdBuilder {
  image: String,
}

impl Default for LxdBuilder {
  fn default() -> Self {
    Self {
      image: "ubuntu:lts".to_string(),
    }
  }
}

impl LxdBuilder {
  fn locate() -> Result<PathBuf, CleanbuildError> {
    which::which("lxc").map_err(|_| CleanbuildError::LxdMissing)
  }

  fn lxc(&self, lxc: &Path, args: &[&str]) -> Result<(), CleanbuildError> {
    let cmd = format!("lxc {}", args.join(" "));
    debug!(cmd = %cmd, "running");
    let status = Command::new(lxc).args(args).status().map_err(|e| CleanbuildError::Spawn {
      cmd: cmd.clone(),
      source: e,
    })?;
    if !status.success() {
      return Err(CleanbuildError::CommandFailed {
        cmd,
        code: status.code(),
      });
    }
    Ok(())
  }

  fn build_in(&self, lxc: &Path, container: &str, tarball: &Path, image: &str, out_dir: &Path) -> Result<PathBuf, CleanbuildError> {
    let exe = std::env::current_exe().map_err(|e| CleanbuildError::Spawn {
      cmd: "current_exe".to_string(),
      source: e,
    })?;
    let tarball_file = tarball
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();

    self.lxc(
      lxc,
      &[
        "file",
        "push",
        &exe.to_string_lossy(),
        &format!("{}/usr/local/bin/{}", container, APP_NAME),
      ],
    )?;
    self.lxc(
      lxc,
      &[
        "file",
        "push",
        "--create-dirs",
        &tarball.to_string_lossy(),
        &format!("{}/root/build/{}", container, tarball_file),
      ],
    )?;

    let script = format!(
      "cd /root/build && tar xzf {} && {} snap --output {}",
      tarball_file, APP_NAME, image
    );
    self.lxc(lxc, &["exec", container, "--", "sh", "-c", &script])?;

    let output = out_dir.join(image);
    self.lxc(
      lxc,
      &[
        "file",
        "pull",
        &format!("{}/root/build/{}", container, image),
        &output.to_string_lossy(),
      ],
    )?;
    Ok(output)
  }
}

impl CleanBuilder for LxdBuilder {
  fn check(&self) -> Result<(), CleanbuildError> {
    Self::locate().map(|_| ())
  }

  fn build(&self, tarball: &Path, image: &str, out_dir: &Path) -> Result<PathBuf, CleanbuildError> {
    let lxc = Self::locate()?;
    let container = format!("{}-{}", APP_NAME, std::process::id());

    info!(container = %container, image = %self.image, "launching build container");
    self.lxc(&lxc, &["launch", "-e", &self.image, &container])?;

    let result = self.build_in(&lxc, &container, tarball, image, out_dir);

    if let Err(e) = self.lxc(&lxc, &["stop", &container]) {
      warn!(container = %container, error = %e, "failed to stop build container");
    }
    result
  }
}
