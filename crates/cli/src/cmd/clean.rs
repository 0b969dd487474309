//! Implementation of the `snapforge clean` command.

use anyhow::{Context, Result};
use serde_json::json;

use snapforge_lib::lifecycle::clean;
use snapforge_lib::project::{Project, ProjectPaths};
use snapforge_lib::step::Step;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

pub fn cmd_clean(paths: &ProjectPaths, parts: &[String], step: Option<Step>, format: OutputFormat) -> Result<()> {
  let project = Project::load(paths.clone()).context("Failed to load project")?;
  let report = clean(&project, parts, step)?;

  if format.is_json() {
    return print_json(&json!({
      "cleaned": report.cleaned,
      "removed": report.removed,
    }));
  }

  if report.cleaned.is_empty() {
    print_info("No parts to clean");
    return Ok(());
  }
  print_success(&format!("Cleaned {} part(s)", report.cleaned.len()));
  print_stat("Parts", &report.cleaned.iter().cloned().collect::<Vec<_>>().join(", "));
  for dir in &report.removed {
    print_stat("Removed", &dir.display().to_string());
  }
  Ok(())
}
