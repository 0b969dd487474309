//! Implementation of the `snapforge init` command.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use snapforge_lib::init::init;
use snapforge_lib::project::ProjectPaths;

use crate::output::symbols;

/// Write a template `snapforge.yaml` into the project directory.
///
/// # Errors
///
/// Returns an error if the file already exists.
pub fn cmd_init(paths: &ProjectPaths) -> Result<()> {
  let created = init(paths).context("Failed to initialize project")?;

  println!(
    "{} {}",
    symbols::SUCCESS.green(),
    format!("Created {}", created.display()).green().bold()
  );
  println!();
  println!("{}", "Next steps:".bold());
  println!("  1. Fill in the name, version and parts in {}", created.display().to_string().cyan());
  println!("  2. Run: {}", "snapforge snap".cyan());

  Ok(())
}
