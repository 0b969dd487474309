use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::step::Step;

/// Inputs that would be used to run each step of a part right now.
pub type StepInputs = BTreeMap<Step, serde_json::Value>;

/// Persisted snapshot of what produced a completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
  /// The inputs the step ran with. A step whose current inputs differ must re-run.
  pub inputs: serde_json::Value,

  /// Files the part placed in a shared area (stage and strip only).
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub files: BTreeSet<String>,

  /// Directories the part placed in a shared area (stage and strip only).
  #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
  pub directories: BTreeSet<String>,
}

impl StateRecord {
  pub fn new(inputs: serde_json::Value) -> Self {
    Self {
      inputs,
      files: BTreeSet::new(),
      directories: BTreeSet::new(),
    }
  }

  pub fn with_contents(mut self, files: BTreeSet<String>, directories: BTreeSet<String>) -> Self {
    self.files = files;
    self.directories = directories;
    self
  }

  pub fn claims(&self, path: &str) -> bool {
    self.files.contains(path) || self.directories.contains(path)
  }
}

/// Errors that can occur when reading or writing part state.
#[derive(Debug, Error)]
pub enum StateError {
  #[error("failed to read state {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to write state {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("failed to create state directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("failed to parse state {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("failed to serialize state: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to remove state {}: {source}", path.display())]
  Remove { path: PathBuf, source: io::Error },
}
