use tracing::debug;

use super::{Plugin, PluginError, PluginOptions, StepContext, pull_local_source, required_option};
use crate::util::fs::{copy_tree, remove_path};

/// Installs a local directory as-is.
///
/// `pull` copies `source` (relative to the project root) into the part's
/// source directory; `build` copies that into the install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlugin {
  source: String,
}

impl CopyPlugin {
  pub fn new(source: impl Into<String>) -> Self {
    Self { source: source.into() }
  }

  pub fn from_options(options: &PluginOptions) -> Result<Self, PluginError> {
    Ok(Self::new(required_option("copy", options, "source")?))
  }
}

impl Plugin for CopyPlugin {
  fn name(&self) -> &str {
    "copy"
  }

  fn pull(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    debug!(part = ctx.part, source = %self.source, "copying source");
    pull_local_source(&self.source, ctx, &ctx.dirs.src)
  }

  fn build(&self, ctx: &StepContext<'_>) -> Result<(), PluginError> {
    remove_path(&ctx.dirs.install)?;
    copy_tree(&ctx.dirs.src, &ctx.dirs.install)?;
    Ok(())
  }
}
