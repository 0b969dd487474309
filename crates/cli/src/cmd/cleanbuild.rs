//! Implementation of the `snapforge cleanbuild` command.

use anyhow::{Context, Result};

use snapforge_lib::cleanbuild::{LxdBuilder, cleanbuild};
use snapforge_lib::project::{Project, ProjectPaths};

use crate::output::print_success;

pub fn cmd_cleanbuild(paths: &ProjectPaths) -> Result<()> {
  let project = Project::load(paths.clone()).context("Failed to load project")?;
  let image = cleanbuild(&project, &LxdBuilder::default()).context("Clean build failed")?;

  print_success(&format!("Snapped {}", image.display()));
  Ok(())
}
