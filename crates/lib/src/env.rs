//! Build environment handed to each `(part, step)` invocation.
//!
//! A fresh value is computed for every invocation, so nothing one part sets
//! leaks into the next.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::warn;

use crate::consts::SOURCE_DATE_EPOCH;
use crate::project::ProjectPaths;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
  vars: BTreeMap<String, OsString>,
}

impl BuildEnvironment {
  /// Environment for building `part`, layered over the host `PATH`.
  pub fn for_part(paths: &ProjectPaths, part: &str) -> Self {
    Self::with_host_path(paths, part, std::env::var_os("PATH"))
  }

  fn with_host_path(paths: &ProjectPaths, part: &str, host_path: Option<OsString>) -> Self {
    let dirs = paths.part(part);
    let stage = paths.stage_dir();

    let mut vars = BTreeMap::new();
    vars.insert("SNAPFORGE_PART_NAME".to_string(), OsString::from(part));
    vars.insert("SNAPFORGE_PART_SRC".to_string(), dirs.src.clone().into_os_string());
    vars.insert("SNAPFORGE_PART_BUILD".to_string(), dirs.build.clone().into_os_string());
    vars.insert("SNAPFORGE_PART_INSTALL".to_string(), dirs.install.clone().into_os_string());
    vars.insert("SNAPFORGE_STAGE".to_string(), stage.clone().into_os_string());
    vars.insert("SOURCE_DATE_EPOCH".to_string(), OsString::from(SOURCE_DATE_EPOCH));

    let staged_bins = [stage.join("usr/bin"), stage.join("bin")];
    vars.insert("PATH".to_string(), join_paths(&staged_bins, host_path));

    let staged_libs = [stage.join("usr/lib"), stage.join("lib")];
    vars.insert(
      "LD_LIBRARY_PATH".to_string(),
      join_paths(&staged_libs, std::env::var_os("LD_LIBRARY_PATH")),
    );

    Self { vars }
  }

  pub fn get(&self, key: &str) -> Option<&OsString> {
    self.vars.get(key)
  }

  /// Set every variable on `command`.
  pub fn apply(&self, command: &mut Command) {
    for (key, value) in &self.vars {
      command.env(key, value);
    }
  }
}

fn join_paths(prefix: &[PathBuf], rest: Option<OsString>) -> OsString {
  let mut entries: Vec<PathBuf> = prefix.to_vec();
  if let Some(rest) = rest {
    entries.extend(std::env::split_paths(&rest));
  }
  std::env::join_paths(entries.iter().map(|p| p.as_path())).unwrap_or_else(|e| {
    warn!(error = %e, "host search path cannot be extended, using staged directories only");
    std::env::join_paths(prefix.iter().map(Path::new)).unwrap_or_default()
  })
}
