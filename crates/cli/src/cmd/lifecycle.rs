//! Implementation of the `pull`, `build`, `stage` and `strip` commands.

use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use snapforge_lib::lifecycle::{Collaborators, RunReport, execute};
use snapforge_lib::project::{Project, ProjectPaths};
use snapforge_lib::step::Step;

use crate::output::{OutputFormat, format_duration, print_info, print_json, print_stat, print_step, print_success};

/// Run the lifecycle up to `step` for `parts` (all parts when empty).
pub fn cmd_step(step: Step, paths: &ProjectPaths, parts: &[String], format: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let project = Project::load(paths.clone()).context("Failed to load project")?;

  let report = execute(step, &project, parts, &Collaborators::system())?;

  if format.is_json() {
    print_json(&report_json(&report))?;
  } else {
    print_report(&report);
    println!();
    print_success(&format!("{} complete", step));
    print_stat("Duration", &format_duration(start.elapsed()));
  }
  Ok(())
}

fn print_report(report: &RunReport) {
  if report.executed.is_empty() && report.skipped.is_empty() {
    print_info("Nothing to do");
    return;
  }
  for (step, part) in &report.executed {
    print_step(true, step.as_str(), part);
  }
  for (step, part) in &report.skipped {
    print_step(false, step.as_str(), part);
  }
  if let Some(manifest) = &report.manifest {
    print_stat("Manifest", &manifest.display().to_string());
  }
}

fn report_json(report: &RunReport) -> serde_json::Value {
  let pairs = |items: &[(Step, String)]| {
    items
      .iter()
      .map(|(step, part)| json!({ "step": step, "part": part }))
      .collect::<Vec<_>>()
  };
  json!({
    "executed": pairs(&report.executed),
    "skipped": pairs(&report.skipped),
    "manifest": report.manifest,
  })
}
