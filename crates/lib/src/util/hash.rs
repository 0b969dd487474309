//! Content digests for files and directory trees.
//!
//! This module provides:
//! - `ContentHash`: a full 64-character SHA-256 of file contents
//! - `tree_entries()`: a per-path digest of everything under a directory
//! - `hash_file()` / `hash_bytes()`

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// A full 64-character SHA-256 hash, lowercase hexadecimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What sits at a path inside a tree, reduced to what matters for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryDigest {
  File(ContentHash),
  Dir,
  Symlink(PathBuf),
}

impl EntryDigest {
  pub fn kind(&self) -> &'static str {
    match self {
      EntryDigest::File(_) => "file",
      EntryDigest::Dir => "directory",
      EntryDigest::Symlink(_) => "symlink",
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum TreeHashError {
  #[error("failed to walk directory {}: {message}", path.display())]
  WalkDir { path: PathBuf, message: String },

  #[error("failed to read file {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: std::io::Error },

  #[error("failed to read symlink {}: {source}", path.display())]
  ReadSymlink { path: PathBuf, source: std::io::Error },
}

/// Digest every entry under `root`, keyed by its `/`-separated relative path.
///
/// Symlinks are not followed; their target is recorded instead. Special files
/// (sockets, devices) are skipped. The root itself is not included.
pub fn tree_entries(root: &Path) -> Result<BTreeMap<String, EntryDigest>, TreeHashError> {
  let mut entries = BTreeMap::new();

  for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
    let entry = entry.map_err(|e| TreeHashError::WalkDir {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;
    let Some(rel_path) = relative_key(root, entry.path()) else {
      continue;
    };

    let file_type = entry.file_type();
    let digest = if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|e| TreeHashError::ReadSymlink {
        path: entry.path().to_path_buf(),
        source: e,
      })?;
      EntryDigest::Symlink(target)
    } else if file_type.is_dir() {
      EntryDigest::Dir
    } else if file_type.is_file() {
      EntryDigest::File(hash_file(entry.path())?)
    } else {
      continue;
    };

    entries.insert(rel_path, digest);
  }

  Ok(entries)
}

/// Relative `/`-joined key for `path` under `root`, `None` for the root itself.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
  if parts.is_empty() { None } else { Some(parts.join("/")) }
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<ContentHash, TreeHashError> {
  let mut file = fs::File::open(path).map_err(|e| TreeHashError::ReadFile {
    path: path.to_path_buf(),
    source: e,
  })?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer).map_err(|e| TreeHashError::ReadFile {
      path: path.to_path_buf(),
      source: e,
    })?;
    if bytes_read == 0 {
      break;
    }
    hasher.update(&buffer[..bytes_read]);
  }

  Ok(ContentHash(hex::encode(hasher.finalize())))
}
