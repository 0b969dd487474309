//! Filesystem helpers shared by the plugins, staging, and clean.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy the tree under `src` into `dst`, preserving symlinks.
///
/// Existing files in `dst` are overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
  fs::create_dir_all(dst)?;
  for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
    let entry = entry.map_err(io::Error::other)?;
    let rel = entry.path().strip_prefix(src).map_err(io::Error::other)?;
    copy_entry(entry.path(), &dst.join(rel))?;
  }
  Ok(())
}

/// Copy a single entry (file, symlink, or directory without its contents).
pub fn copy_entry(src: &Path, dst: &Path) -> io::Result<()> {
  let metadata = src.symlink_metadata()?;
  let file_type = metadata.file_type();

  if file_type.is_dir() {
    return fs::create_dir_all(dst);
  }

  if let Some(parent) = dst.parent() {
    fs::create_dir_all(parent)?;
  }
  remove_path(dst)?;

  if file_type.is_symlink() {
    let target = fs::read_link(src)?;
    create_symlink(&target, dst)
  } else {
    fs::copy(src, dst).map(|_| ())
  }
}

/// Remove a file, symlink, or directory tree. Missing paths are fine.
pub fn remove_path(path: &Path) -> io::Result<()> {
  let metadata = match path.symlink_metadata() {
    Ok(m) => m,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
    Err(e) => return Err(e),
  };
  if metadata.file_type().is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  }
}

/// Remove `path` if it is a directory with no entries. Returns whether it was removed.
pub fn remove_dir_if_empty(path: &Path) -> io::Result<bool> {
  if !path.is_dir() {
    return Ok(false);
  }
  if fs::read_dir(path)?.next().is_some() {
    return Ok(false);
  }
  fs::remove_dir(path)?;
  Ok(true)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_file(target, link)
}
