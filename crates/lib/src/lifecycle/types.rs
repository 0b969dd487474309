//! Types for lifecycle execution and cleaning.

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::collision::CollisionError;
use crate::graph::GraphError;
use crate::meta::{ManifestError, ManifestGenerator, MetaYaml};
use crate::part::PartError;
use crate::project::ProjectError;
use crate::repo::{AptInstaller, PackageInstaller, RepoError};
use crate::state::StateError;
use crate::step::Step;

/// Errors that abort a lifecycle run or a clean.
///
/// Nothing already recorded is rolled back; re-running the same command
/// resumes from the last satisfied step.
#[derive(Debug, Error)]
pub enum LifecycleError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error(transparent)]
  State(#[from] StateError),

  #[error(transparent)]
  Collision(#[from] CollisionError),

  #[error("requested '{step}' of '{part}' but there are unsatisfied prerequisites: {}", .prerequisites.join(" "))]
  UnsatisfiedPrerequisites {
    step: Step,
    part: String,
    prerequisites: Vec<String>,
  },

  #[error("part '{0}' depends on itself through its prerequisites")]
  PrerequisiteCycle(String),

  #[error("failed to {step} '{part}': {source}")]
  Step {
    step: Step,
    part: String,
    #[source]
    source: PartError,
  },

  #[error(transparent)]
  Repo(#[from] RepoError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error("failed to remove {}: {source}", path.display())]
  Remove { path: PathBuf, source: io::Error },
}

/// What a run did, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
  pub executed: Vec<(Step, String)>,
  /// Steps skipped because they had already run with the same inputs.
  pub skipped: Vec<(Step, String)>,
  /// Path of the generated manifest, set only by full-project `strip` runs.
  pub manifest: Option<PathBuf>,
}

impl RunReport {
  pub fn executed_step(&self, step: Step, part: &str) -> bool {
    self.executed.iter().any(|(s, p)| *s == step && p == part)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
  /// Parts that were cleaned, including reverse dependents pulled in.
  pub cleaned: BTreeSet<String>,
  /// Shared directories removed during reclamation.
  pub removed: Vec<PathBuf>,
}

/// External services a run relies on.
pub struct Collaborators {
  pub installer: Box<dyn PackageInstaller>,
  pub manifest: Box<dyn ManifestGenerator>,
}

impl Collaborators {
  /// `apt-get` for build packages and `meta/package.yaml` for the manifest.
  pub fn system() -> Self {
    Self {
      installer: Box::new(AptInstaller),
      manifest: Box::new(MetaYaml),
    }
  }
}
