use super::{Plugin, PluginError, StepContext};

/// A plugin with no source and nothing to build.
///
/// Useful for parts that only exist to carry `after` edges or build packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilPlugin;

impl Plugin for NilPlugin {
  fn name(&self) -> &str {
    "nil"
  }

  fn pull(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }

  fn build(&self, _ctx: &StepContext<'_>) -> Result<(), PluginError> {
    Ok(())
  }
}
