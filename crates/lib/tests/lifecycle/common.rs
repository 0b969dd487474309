//! Shared helpers for lifecycle tests.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use snapforge_lib::lifecycle::Collaborators;
use snapforge_lib::meta::{ManifestError, ManifestGenerator, MetaYaml};
use snapforge_lib::part::Part;
use snapforge_lib::plugin::{Plugin, PluginError, StepContext};
use snapforge_lib::project::{Project, ProjectMetadata, ProjectPaths};
use snapforge_lib::repo::{PackageInstaller, RepoError};
use tempfile::TempDir;

/// Ordered record of everything the collaborators were asked to do.
pub type Log = Rc<RefCell<Vec<String>>>;

/// Plugin that logs its calls and installs a fixed set of files.
#[derive(Debug)]
pub struct RecordingPlugin {
  log: Log,
  files: Vec<(String, String)>,
  fail_build: bool,
}

impl RecordingPlugin {
  pub fn new(log: &Log) -> Self {
    Self {
      log: Rc::clone(log),
      files: Vec::new(),
      fail_build: false,
    }
  }

  pub fn installs(mut self, path: &str, content: &str) -> Self {
    self.files.push((path.to_string(), content.to_string()));
    self
  }

  pub fn failing(mut self) -> Self {
    self.fail_build = true;
    self
  }

  fn note(&self, what: &str, ctx: &StepContext<'_>) {
    self.log.borrow_mut().push(format!("{} {}", what, ctx.part));
  }
}

impl Plugin for RecordingPlugin {
  fn name(&self) -> &str {
    "recording"
  }

  fn pull(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    self.note("pull", ctx);
    fs::create_dir_all(&ctx.dirs.src)?;
    Ok(())
  }

  fn prepare_build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    self.note("prepare_build", ctx);
    Ok(())
  }

  fn build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    self.note("build", ctx);
    if self.fail_build {
      return Err(PluginError::CommandFailed {
        cmd: "make".to_string(),
        code: Some(2),
      });
    }

    let env_install = ctx.env.get("SNAPFORGE_PART_INSTALL").map(PathBuf::from);
    assert_eq!(env_install.as_ref(), Some(&ctx.dirs.install));

    for (path, content) in &self.files {
      let dest = ctx.dirs.install.join(path);
      if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
      }
      fs::write(dest, content)?;
    }
    Ok(())
  }
}

struct RecordingInstaller(Log);

impl PackageInstaller for RecordingInstaller {
  fn install(&self, packages: &BTreeSet<String>) -> Result<(), RepoError> {
    if !packages.is_empty() {
      let list: Vec<&str> = packages.iter().map(String::as_str).collect();
      self.0.borrow_mut().push(format!("install {}", list.join(" ")));
    }
    Ok(())
  }
}

struct RecordingManifest(Log);

impl ManifestGenerator for RecordingManifest {
  fn generate(&self, metadata: &ProjectMetadata, strip_dir: &std::path::Path) -> Result<PathBuf, ManifestError> {
    self.0.borrow_mut().push("manifest".to_string());
    MetaYaml.generate(metadata, strip_dir)
  }
}

/// Isolated project directory with a shared call log.
pub struct Fixture {
  pub temp: TempDir,
  pub log: Log,
}

impl Fixture {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
      log: Log::default(),
    }
  }

  pub fn paths(&self) -> ProjectPaths {
    ProjectPaths::new(self.temp.path())
  }

  pub fn plugin(&self) -> RecordingPlugin {
    RecordingPlugin::new(&self.log)
  }

  pub fn part(&self, name: &str, plugin: RecordingPlugin) -> Part {
    Part::new(name, Box::new(plugin))
  }

  pub fn project(&self, parts: Vec<Part>) -> Project {
    Project::new(ProjectMetadata::new("hello", "1.0"), parts, self.paths()).unwrap()
  }

  /// `base` installs `bin/base`; `app` comes after it and installs `bin/app`.
  pub fn base_and_app(&self) -> Project {
    self.project(vec![
      self.part("base", self.plugin().installs("bin/base", "base")),
      self.part("app", self.plugin().installs("bin/app", "app")).with_after(["base"]),
    ])
  }

  pub fn collaborators(&self) -> Collaborators {
    Collaborators {
      installer: Box::new(RecordingInstaller(Rc::clone(&self.log))),
      manifest: Box::new(RecordingManifest(Rc::clone(&self.log))),
    }
  }

  pub fn calls(&self) -> Vec<String> {
    self.log.borrow().clone()
  }

  pub fn clear(&self) {
    self.log.borrow_mut().clear();
  }

  pub fn position(&self, call: &str) -> usize {
    self
      .calls()
      .iter()
      .position(|c| c == call)
      .unwrap_or_else(|| panic!("'{}' was never called: {:?}", call, self.calls()))
  }
}

/// Shorthand for running with every part.
pub const ALL: &[&str] = &[];
