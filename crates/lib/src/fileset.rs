//! Include/exclude path lists used by the `stage` and `strip` part keys.
//!
//! Entries are relative paths. An entry prefixed with `-` excludes that path
//! and everything below it. With no include entries, everything is included.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct FileSet {
  includes: Vec<String>,
  excludes: Vec<String>,
}

impl FileSet {
  pub fn new<I, S>(entries: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut set = FileSet::default();
    for entry in entries {
      let entry = entry.as_ref().trim();
      if let Some(excluded) = entry.strip_prefix('-') {
        set.excludes.push(normalize(excluded));
      } else if !entry.is_empty() {
        set.includes.push(normalize(entry));
      }
    }
    set
  }

  /// Whether a `/`-separated relative path belongs to this set.
  ///
  /// Ancestors of an included path are also matched so the directories
  /// leading to it get created.
  pub fn matches(&self, path: &str) -> bool {
    if self.excludes.iter().any(|e| is_same_or_under(path, e)) {
      return false;
    }
    if self.includes.is_empty() {
      return true;
    }
    self
      .includes
      .iter()
      .any(|i| is_same_or_under(path, i) || is_same_or_under(i, path))
  }
}

impl From<Vec<String>> for FileSet {
  fn from(entries: Vec<String>) -> Self {
    FileSet::new(entries)
  }
}

impl From<FileSet> for Vec<String> {
  fn from(set: FileSet) -> Self {
    set
      .includes
      .into_iter()
      .chain(set.excludes.into_iter().map(|e| format!("-{}", e)))
      .collect()
  }
}

fn normalize(entry: &str) -> String {
  entry.trim().trim_start_matches("./").trim_matches('/').to_string()
}

/// `path == base` or `path` lies below `base`.
fn is_same_or_under(path: &str, base: &str) -> bool {
  path == base || path.strip_prefix(base).is_some_and(|rest| rest.starts_with('/'))
}
