//! Shell plugin: runs a build script with the part's build environment.

use std::fs;
use std::process::Command;

use tracing::{debug, info};

use super::{Plugin, PluginError, PluginOptions, StepContext, pull_local_source, required_option, string_option};
use crate::util::fs::{copy_tree, remove_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellPlugin {
  source: Option<String>,
  script: String,
}

impl ShellPlugin {
  pub fn new(source: Option<String>, script: impl Into<String>) -> Self {
    Self {
      source,
      script: script.into(),
    }
  }

  pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
    Ok(Self::new(
      string_option(options, "source")?,
      required_option("shell", options, "build")?,
    ))
  }
}

impl Plugin for ShellPlugin {
  fn name(&self) -> &str {
    "shell"
  }

  fn pull(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    match &self.source {
      Some(source) => pull_local_source(source, ctx, &ctx.dirs.src),
      None => {
        fs::create_dir_all(&ctx.dirs.src)?;
        Ok(())
      }
    }
  }

  /// Start every build from a fresh copy of the pulled source.
  fn prepare_build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    remove_path(&ctx.dirs.build)?;
    copy_tree(&ctx.dirs.src, &ctx.dirs.build)?;
    Ok(())
  }

  fn build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    fs::create_dir_all(&ctx.dirs.install)?;
    info!(part = ctx.part, "running build script");

    let mut command = Command::new("/bin/sh");
    command.arg("-c").arg(&self.script).current_dir(&ctx.dirs.build);
    ctx.env.apply(&mut command);

    let output = command.output()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
      debug!(part = ctx.part, stdout = %stdout.trim(), "build output");
    }

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if !stderr.trim().is_empty() {
        debug!(part = ctx.part, stderr = %stderr.trim(), "build stderr");
      }
      return Err(PluginError::CommandFailed {
        cmd: self.script.clone(),
        code: output.status.code(),
      });
    }
    Ok(())
  }
}
