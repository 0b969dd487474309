//! A part: one named build unit and the generic handling of its steps.
//!
//! `pull` and `build` are delegated to the part's plugin. `stage` and `strip`
//! are the same for every plugin: stage merges the install directory into the
//! shared staging area, strip copies the staged files into the stripping
//! area. Both are narrowed by the part's filesets.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::fileset::FileSet;
use crate::plugin::{self, Plugin, PluginError, StepContext};
use crate::project::ProjectPaths;
use crate::state::{StateError, StateStore, StepInputs};
use crate::step::Step;
use crate::util::fs::copy_entry;
use crate::util::hash::relative_key;

#[derive(Debug, Error)]
pub enum PartError {
  #[error(transparent)]
  Plugin(#[from] PluginError),

  #[error("failed to copy {}: {source}", path.display())]
  Copy { path: PathBuf, source: io::Error },

  #[error("failed to walk directory {}: {message}", path.display())]
  Walk { path: PathBuf, message: String },

  #[error(transparent)]
  State(#[from] StateError),
}

/// Files and directories a part placed in a shared area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contents {
  pub files: BTreeSet<String>,
  pub directories: BTreeSet<String>,
}

pub struct Part {
  name: String,
  after: Vec<String>,
  plugin: Box<dyn Plugin>,
  stage: FileSet,
  strip: FileSet,
  properties: serde_json::Value,
  build_packages: Vec<String>,
}

impl fmt::Debug for Part {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Part")
      .field("name", &self.name)
      .field("after", &self.after)
      .field("plugin", &self.plugin.name())
      .finish_non_exhaustive()
  }
}

impl Part {
  pub fn new(name: impl Into<String>, plugin: Box<dyn Plugin>) -> Self {
    let properties = serde_json::json!({ "plugin": plugin.name() });
    Self {
      name: name.into(),
      after: Vec::new(),
      plugin,
      stage: FileSet::default(),
      strip: FileSet::default(),
      properties,
      build_packages: Vec::new(),
    }
  }

  pub fn with_after<I, S>(mut self, after: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.after = after.into_iter().map(Into::into).collect();
    self
  }

  pub fn with_stage(mut self, stage: FileSet) -> Self {
    self.stage = stage;
    self
  }

  pub fn with_strip(mut self, strip: FileSet) -> Self {
    self.strip = strip;
    self
  }

  /// Plugin configuration; a change re-runs `pull` and everything after it.
  pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
    self.properties = properties;
    self
  }

  pub fn with_build_packages(mut self, packages: Vec<String>) -> Self {
    self.build_packages = packages;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn after(&self) -> &[String] {
    &self.after
  }

  pub fn plugin(&self) -> &dyn Plugin {
    self.plugin.as_ref()
  }

  pub fn stage_fileset(&self) -> &FileSet {
    &self.stage
  }

  /// Packages the part itself and its plugin need on the host.
  pub fn build_packages(&self) -> BTreeSet<String> {
    self
      .build_packages
      .iter()
      .cloned()
      .chain(self.plugin.build_packages())
      .collect()
  }

  /// The inputs each step would run with now.
  pub fn inputs(&self) -> StepInputs {
    let fileset = |set: &FileSet| serde_json::Value::from(Vec::<String>::from(set.clone()));
    StepInputs::from([
      (Step::Pull, self.properties.clone()),
      (Step::Build, self.properties.clone()),
      (Step::Stage, fileset(&self.stage)),
      (Step::Strip, fileset(&self.strip)),
    ])
  }

  pub fn prepare(&self, step: Step, ctx: &StepContext<'_>) -> Result<(), PartError> {
    plugin::prepare(self.plugin.as_ref(), step, ctx)?;
    Ok(())
  }

  /// Run `step` and report what ended up in a shared area.
  pub fn run_step(
    &self,
    step: Step,
    ctx: &StepContext<'_>,
    paths: &ProjectPaths,
    store: &StateStore,
  ) -> Result<Contents, PartError> {
    match step {
      Step::Pull => {
        self.plugin.pull(ctx)?;
        Ok(Contents::default())
      }
      Step::Build => {
        self.plugin.build(ctx)?;
        Ok(Contents::default())
      }
      Step::Stage => {
        let contents = contribution(&ctx.dirs.install, &self.stage)?;
        copy_contents(&contents, &ctx.dirs.install, &paths.stage_dir())?;
        debug!(part = %self.name, files = contents.files.len(), "staged");
        Ok(contents)
      }
      Step::Strip => {
        let staged = store.load(&self.name, Step::Stage)?;
        let (files, directories) = staged.map(|r| (r.files, r.directories)).unwrap_or_default();
        let contents = Contents {
          files: files.into_iter().filter(|p| self.strip.matches(p)).collect(),
          directories: directories.into_iter().filter(|p| self.strip.matches(p)).collect(),
        };
        copy_contents(&contents, &paths.stage_dir(), &paths.strip_dir())?;
        debug!(part = %self.name, files = contents.files.len(), "stripped");
        Ok(contents)
      }
    }
  }
}

/// Entries under `root` selected by `fileset`. A missing root contributes nothing.
pub fn contribution(root: &Path, fileset: &FileSet) -> Result<Contents, PartError> {
  let mut contents = Contents::default();
  if !root.exists() {
    return Ok(contents);
  }

  for entry in WalkDir::new(root).follow_links(false) {
    let entry = entry.map_err(|e| PartError::Walk {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;
    let Some(key) = relative_key(root, entry.path()) else {
      continue;
    };
    if !fileset.matches(&key) {
      continue;
    }
    if entry.file_type().is_dir() {
      contents.directories.insert(key);
    } else {
      contents.files.insert(key);
    }
  }
  Ok(contents)
}

fn copy_contents(contents: &Contents, from: &Path, to: &Path) -> Result<(), PartError> {
  fs::create_dir_all(to).map_err(|e| PartError::Copy {
    path: to.to_path_buf(),
    source: e,
  })?;
  for dir in &contents.directories {
    let dest = to.join(dir);
    fs::create_dir_all(&dest).map_err(|e| PartError::Copy { path: dest, source: e })?;
  }
  for file in &contents.files {
    let src = from.join(file);
    copy_entry(&src, &to.join(file)).map_err(|e| PartError::Copy { path: src, source: e })?;
  }
  Ok(())
}
