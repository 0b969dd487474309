//! Installation of host build packages.
//!
//! Invoked once per lifecycle run with the union of the project's and its
//! parts' `build-packages`. Any failure aborts the run.

use std::collections::BTreeSet;
use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RepoError {
  #[error("'{0}' not found on PATH; cannot install build packages")]
  ToolMissing(String),

  #[error("failed to run {cmd}: {source}")]
  Spawn { cmd: String, source: io::Error },

  #[error("installing build packages failed with exit code {code:?}: {packages}")]
  InstallFailed { packages: String, code: Option<i32> },
}

pub trait PackageInstaller {
  fn install(&self, packages: &BTreeSet<String>) -> Result<(), RepoError>;
}

/// Debian/Ubuntu installer backed by `dpkg-query` and `apt-get`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AptInstaller;

impl AptInstaller {
  fn is_installed(&self, package: &str) -> bool {
    Command::new("dpkg-query")
      .args(["-W", "-f=${Status}", package])
      .output()
      .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).contains("install ok installed"))
      .unwrap_or(false)
  }
}

impl PackageInstaller for AptInstaller {
  fn install(&self, packages: &BTreeSet<String>) -> Result<(), RepoError> {
    if packages.is_empty() {
      return Ok(());
    }

    let missing: Vec<&str> = packages
      .iter()
      .map(String::as_str)
      .filter(|p| !self.is_installed(p))
      .collect();
    if missing.is_empty() {
      debug!(count = packages.len(), "build packages already installed");
      return Ok(());
    }

    let apt = which::which("apt-get").map_err(|_| RepoError::ToolMissing("apt-get".to_string()))?;
    let mut command = match which::which("sudo") {
      Ok(sudo) => {
        let mut c = Command::new(sudo);
        c.arg(apt);
        c
      }
      Err(_) => Command::new(apt),
    };
    command.args(["install", "-y"]).args(&missing);

    info!(packages = %missing.join(" "), "installing build packages");
    let status = command.status().map_err(|e| RepoError::Spawn {
      cmd: "apt-get".to_string(),
      source: e,
    })?;
    if !status.success() {
      return Err(RepoError::InstallFailed {
        packages: missing.join(" "),
        code: status.code(),
      });
    }
    Ok(())
  }
}
