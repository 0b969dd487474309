//! Implementation of the `snapforge snap` command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use snapforge_lib::lifecycle::Collaborators;
use snapforge_lib::pack::{Mksquashfs, snap, snap_directory};
use snapforge_lib::project::{Project, ProjectPaths};

use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success};

/// Pack `directory`, or run the whole lifecycle and pack the stripped tree.
pub fn cmd_snap(paths: &ProjectPaths, directory: Option<&Path>, output: Option<&Path>, format: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let image = match directory {
    Some(dir) => snap_directory(dir, output, paths.root(), &Mksquashfs).context("Failed to pack directory")?,
    None => {
      let project = Project::load(paths.clone()).context("Failed to load project")?;
      snap(&project, output, &Collaborators::system(), &Mksquashfs)?
    }
  };

  if format.is_json() {
    print_json(&json!({ "image": image }))?;
  } else {
    println!();
    print_success(&format!("Snapped {}", image.display()));
    print_stat("Duration", &format_duration(start.elapsed()));
  }
  Ok(())
}
