use std::path::{Path, PathBuf};

use crate::consts::{
  LOCAL_PLUGINS_DIR, PART_BUILD_DIR, PART_INSTALL_DIR, PART_SRC_DIR, PART_STATE_DIR, PARTS_DIR, PROJECT_FILENAME,
  STAGE_DIR, STRIP_DIR,
};

/// Working directories of a project, all derived from its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
  root: PathBuf,
}

impl ProjectPaths {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn config_file(&self) -> PathBuf {
    self.root.join(PROJECT_FILENAME)
  }

  pub fn parts_dir(&self) -> PathBuf {
    self.root.join(PARTS_DIR)
  }

  /// Shared staging area.
  pub fn stage_dir(&self) -> PathBuf {
    self.root.join(STAGE_DIR)
  }

  /// Shared stripping area, the tree that gets packaged.
  pub fn strip_dir(&self) -> PathBuf {
    self.root.join(STRIP_DIR)
  }

  pub fn local_plugins_dir(&self) -> PathBuf {
    self.parts_dir().join(LOCAL_PLUGINS_DIR)
  }

  pub fn part(&self, name: &str) -> PartDirs {
    PartDirs::new(self.parts_dir().join(name))
  }
}

/// Per-part working directories under `parts/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDirs {
  pub base: PathBuf,
  pub src: PathBuf,
  pub build: PathBuf,
  pub install: PathBuf,
  pub state: PathBuf,
}

impl PartDirs {
  fn new(base: PathBuf) -> Self {
    Self {
      src: base.join(PART_SRC_DIR),
      build: base.join(PART_BUILD_DIR),
      install: base.join(PART_INSTALL_DIR),
      state: base.join(PART_STATE_DIR),
      base,
    }
  }
}
