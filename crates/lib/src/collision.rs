//! Stage-time collision detection.
//!
//! Every part's contribution to the staging area is its install directory
//! narrowed by its stage fileset. Two parts may place the same path only if
//! what they place there is identical.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::part::Part;
use crate::project::ProjectPaths;
use crate::util::hash::{EntryDigest, TreeHashError, tree_entries};

#[derive(Debug, Error)]
pub enum CollisionError {
  #[error("parts {} stage different contents at '{path}'", .parts.join(", "))]
  Conflict { path: String, parts: Vec<String> },

  #[error(transparent)]
  Hash(#[from] TreeHashError),
}

/// Fail on the first path where two of `parts` would stage differing entries.
pub fn check<'a, I>(parts: I, paths: &ProjectPaths) -> Result<(), CollisionError>
where
  I: IntoIterator<Item = &'a Part>,
{
  let mut by_path: BTreeMap<String, Vec<(&'a str, EntryDigest)>> = BTreeMap::new();

  for part in parts {
    let install = paths.part(part.name()).install;
    if !install.exists() {
      continue;
    }
    for (path, digest) in tree_entries(&install)? {
      if part.stage_fileset().matches(&path) {
        by_path.entry(path).or_default().push((part.name(), digest));
      }
    }
  }

  for (path, contributions) in by_path {
    let Some((_, first)) = contributions.first() else {
      continue;
    };
    if contributions.iter().all(|(_, digest)| digest == first) {
      continue;
    }

    let mut parts: Vec<String> = contributions.iter().map(|(name, _)| name.to_string()).collect();
    parts.sort();
    debug!(path = %path, kinds = ?contributions.iter().map(|(_, d)| d.kind()).collect::<Vec<_>>(), "collision");
    return Err(CollisionError::Conflict { path, parts });
  }

  Ok(())
}
