//! Lifecycle execution and cleaning.
//!
//! [`execute`] is the entry point used by the CLI: it installs the project's
//! build packages and then drives the [`Executor`]. [`clean`] undoes steps.

mod clean;
mod executor;
mod types;

use tracing::info;

use crate::project::Project;
use crate::step::Step;

pub use clean::clean;
pub use executor::Executor;
pub use types::{CleanReport, Collaborators, LifecycleError, RunReport};

/// Run the lifecycle up to `step` for `part_names`, or for every part when empty.
///
/// Unknown part names are reported before anything is installed or run.
pub fn execute<S: AsRef<str>>(
  step: Step,
  project: &Project,
  part_names: &[S],
  collaborators: &Collaborators,
) -> Result<RunReport, LifecycleError> {
  project.validate_parts(part_names)?;

  let tools = project.build_tools();
  if !tools.is_empty() {
    info!(count = tools.len(), "checking build packages");
  }
  collaborators.installer.install(&tools)?;

  Executor::new(project, collaborators.manifest.as_ref()).run(step, part_names)
}
