//! Plugins perform the source-specific work of a part.
//!
//! The lifecycle only calls into a plugin for `pull` and `build`; `stage` and
//! `strip` are generic and handled by [`crate::part::Part`]. Every step has a
//! preparation hook that defaults to doing nothing.

mod copy;
mod nil;
mod shell;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::env::BuildEnvironment;
use crate::project::PartDirs;
use crate::step::Step;

pub use copy::CopyPlugin;
pub use nil::NilPlugin;
pub use shell::ShellPlugin;

/// Plugin-specific part keys, as written in the project file.
pub type PluginOptions = BTreeMap<String, serde_yaml::Value>;

#[derive(Debug, Error)]
pub enum PluginError {
  #[error("unknown plugin '{0}'")]
  UnknownPlugin(String),

  #[error("plugin '{plugin}' requires the '{option}' key")]
  MissingOption { plugin: String, option: String },

  #[error("invalid value for '{option}': {message}")]
  InvalidOption { option: String, message: String },

  #[error("source directory {} does not exist", path.display())]
  SourceMissing { path: PathBuf },

  #[error("command failed with exit code {code:?}: {cmd}")]
  CommandFailed { cmd: String, code: Option<i32> },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Everything a plugin may look at while running a step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
  pub part: &'a str,
  pub dirs: &'a PartDirs,
  pub env: &'a BuildEnvironment,
  pub project_root: &'a Path,
}

pub trait Plugin: fmt::Debug {
  fn name(&self) -> &str;

  /// Host packages needed to run this plugin.
  fn build_packages(&self) -> Vec<String> {
    Vec::new()
  }

  fn pull(&self, ctx: &StepContext<'_>) -> Result<(), PluginError>;

  fn build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError>;

  fn prepare_pull(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }

  fn prepare_build(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }

  fn prepare_stage(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }

  fn prepare_strip(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }
}

/// Run the preparation hook that belongs to `step`.
pub fn prepare(plugin: &dyn Plugin, step: Step, ctx: &StepContext<'_>) -> Result<(), PluginError> {
  match step {
    Step::Pull => plugin.prepare_pull(ctx),
    Step::Build => plugin.prepare_build(ctx),
    Step::Stage => plugin.prepare_stage(ctx),
    Step::Strip => plugin.prepare_strip(ctx),
  }
}

/// Instantiate a built-in plugin by name.
pub fn load(name: &str, options: &PluginOptions) -> Result<Box<dyn Plugin>, PluginError> {
  match name {
    "nil" => Ok(Box::new(NilPlugin)),
    "copy" => Ok(Box::new(CopyPlugin::from_options(options)?)),
    "shell" => Ok(Box::new(ShellPlugin::from_options(options)?)),
    other => Err(PluginError::UnknownPlugin(other.to_string())),
  }
}

fn string_option(options: &PluginOptions, key: &str) -> Result<Option<String>, PluginError> {
  match options.get(key) {
    None | Some(serde_yaml::Value::Null) => Ok(None),
    Some(serde_yaml::Value::String(s)) => Ok(Some(s.clone())),
    Some(other) => Err(PluginError::InvalidOption {
      option: key.to_string(),
      message: format!("expected a string, found {:?}", other),
    }),
  }
}

fn required_option(plugin: &str, options: &PluginOptions, key: &str) -> Result<String, PluginError> {
  string_option(options, key)?.ok_or_else(|| PluginError::MissingOption {
    plugin: plugin.to_string(),
    option: key.to_string(),
  })
}

/// Copy a local source directory, relative to the project root, into `dest`.
fn pull_local_source(source: &str, ctx: &StepContext<'_>, dest: &Path) -> Result<(), PluginError> {
  let path = ctx.project_root.join(source);
  if !path.is_dir() {
    return Err(PluginError::SourceMissing { path });
  }
  crate::util::fs::remove_path(dest)?;
  crate::util::fs::copy_tree(&path, dest)?;
  Ok(())
}
