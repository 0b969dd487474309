//! The lifecycle state machine.
//!
//! A run walks steps in fixed order across the whole active part set
//! (step-major). Before a part runs any step, its prerequisites are staged
//! by a nested run restricted to them.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::collision;
use crate::env::BuildEnvironment;
use crate::meta::ManifestGenerator;
use crate::part::{Contents, Part};
use crate::plugin::StepContext;
use crate::project::{Project, ProjectError};
use crate::state::{StateRecord, StateStore};
use crate::step::Step;

use super::clean::clean_part;
use super::types::{LifecycleError, RunReport};

/// Sets fixed for the duration of one top-level run.
struct RunScope<'s> {
  /// Parts the top-level request may act on.
  includable: &'s BTreeSet<String>,
  /// Project parts whose staging was not satisfied when the run began.
  dirty: &'s BTreeSet<String>,
}

pub struct Executor<'a> {
  project: &'a Project,
  manifest: &'a dyn ManifestGenerator,
  store: StateStore,
  report: RunReport,
  /// Parts currently waiting on their prerequisites to be staged.
  resolving: Vec<String>,
}

impl<'a> Executor<'a> {
  pub fn new(project: &'a Project, manifest: &'a dyn ManifestGenerator) -> Self {
    Self {
      project,
      manifest,
      store: StateStore::new(project.paths().clone()),
      report: RunReport::default(),
      resolving: Vec::new(),
    }
  }

  /// Run every step up to `step` for `part_names`, or for all parts when empty.
  pub fn run<S: AsRef<str>>(mut self, step: Step, part_names: &[S]) -> Result<RunReport, LifecycleError> {
    let all = self.project.part_names();
    let active: BTreeSet<String> = if part_names.is_empty() {
      all.clone()
    } else {
      self.project.validate_parts(part_names)?;
      part_names.iter().map(|n| n.as_ref().to_string()).collect()
    };

    let mut dirty = BTreeSet::new();
    for part in self.project.parts() {
      if !self.store.is_satisfied(part.name(), Step::Stage, &part.inputs())? {
        dirty.insert(part.name().to_string());
      }
    }
    debug!(target_step = %step, active = active.len(), dirty = dirty.len(), "starting run");

    let scope = RunScope {
      includable: &active,
      dirty: &dirty,
    };
    self.run_steps(step, &active, &scope, false)?;

    if step == Step::Strip && active == all {
      let path = self
        .manifest
        .generate(self.project.metadata(), &self.project.paths().strip_dir())?;
      self.report.manifest = Some(path);
    }

    Ok(self.report)
  }

  fn run_steps(
    &mut self,
    target: Step,
    parts: &BTreeSet<String>,
    scope: &RunScope<'_>,
    recursed: bool,
  ) -> Result<(), LifecycleError> {
    for step in target.up_to() {
      if step == Step::Stage {
        collision::check(self.project.parts(), self.project.paths())?;
      }
      for name in parts {
        self.run_step(step, name, scope, recursed)?;
      }
    }
    Ok(())
  }

  fn run_step(&mut self, step: Step, name: &str, scope: &RunScope<'_>, recursed: bool) -> Result<(), LifecycleError> {
    let project = self.project;
    let part = project
      .part(name)
      .ok_or_else(|| ProjectError::UnknownParts(vec![name.to_string()]))?;

    let mut prereqs = project.graph().prerequisites(name)?;
    if recursed {
      prereqs.retain(|p| scope.dirty.contains(p));
    }
    if !prereqs.is_empty() {
      self.stage_prerequisites(step, name, prereqs, scope)?;
    }

    let inputs = part.inputs();
    if self.store.is_satisfied(name, step, &inputs)? {
      info!(part = name, %step, "skipping {} (already ran)", step);
      self.report.skipped.push((step, name.to_string()));
      return Ok(());
    }

    // Stale output from a previous run must not survive in the shared areas.
    if self.store.last_step(name)? >= Some(step) {
      clean_part(project, &self.store, name, step)?;
    }
    let contents = self.invoke(step, part)?;

    let input = inputs.get(&step).cloned().unwrap_or_default();
    let record = StateRecord::new(input).with_contents(contents.files, contents.directories);
    self.store.record(name, step, &record)?;
    self.report.executed.push((step, name.to_string()));
    Ok(())
  }

  fn stage_prerequisites(
    &mut self,
    step: Step,
    name: &str,
    prereqs: BTreeSet<String>,
    scope: &RunScope<'_>,
  ) -> Result<(), LifecycleError> {
    let project = self.project;
    let mut missing = Vec::new();
    for prereq in prereqs.iter().filter(|p| !scope.includable.contains(*p)) {
      let staged = match project.part(prereq) {
        Some(p) => self.store.is_satisfied(prereq, Step::Stage, &p.inputs())?,
        None => false,
      };
      if !staged {
        missing.push(prereq.clone());
      }
    }
    if !missing.is_empty() {
      return Err(LifecycleError::UnsatisfiedPrerequisites {
        step,
        part: name.to_string(),
        prerequisites: missing,
      });
    }

    let included: BTreeSet<String> = prereqs.into_iter().filter(|p| scope.includable.contains(p)).collect();
    if included.is_empty() {
      return Ok(());
    }
    if self.resolving.iter().any(|r| r == name) {
      return Err(LifecycleError::PrerequisiteCycle(name.to_string()));
    }

    info!(
      part = name,
      prerequisites = %included.iter().cloned().collect::<Vec<_>>().join(" "),
      "part has prerequisites that need to be staged"
    );
    self.resolving.push(name.to_string());
    let result = self.run_steps(Step::Stage, &included, scope, true);
    self.resolving.pop();
    result
  }

  fn invoke(&self, step: Step, part: &Part) -> Result<Contents, LifecycleError> {
    let paths = self.project.paths();
    let dirs = paths.part(part.name());
    let env = BuildEnvironment::for_part(paths, part.name());
    let ctx = StepContext {
      part: part.name(),
      dirs: &dirs,
      env: &env,
      project_root: paths.root(),
    };
    let step_err = |source| LifecycleError::Step {
      step,
      part: part.name().to_string(),
      source,
    };

    info!(part = part.name(), %step, "running {}", step);
    part.prepare(step, &ctx).map_err(step_err)?;
    part.run_step(step, &ctx, paths, &self.store).map_err(step_err)
  }
}
