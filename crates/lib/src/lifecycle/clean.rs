//! Cleaning: the inverse of a run.
//!
//! Cleaning a part for a step undoes that step and every later one. Named
//! parts drag their reverse dependents along, since a dependency's staged
//! output cannot go while something built against it remains.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::project::Project;
use crate::state::{StateRecord, StateStore};
use crate::step::Step;
use crate::util::fs::{remove_dir_if_empty, remove_path};

use super::types::{CleanReport, LifecycleError};

/// Clean `part_names` and their reverse dependents, or every part when empty.
///
/// Without a step, everything from `pull` on is cleaned. Shared directories
/// that no remaining part needs are reclaimed afterwards.
pub fn clean<S: AsRef<str>>(
  project: &Project,
  part_names: &[S],
  step: Option<Step>,
) -> Result<CleanReport, LifecycleError> {
  let step = step.unwrap_or(Step::Pull);
  let mut report = CleanReport::default();

  let targets = if part_names.is_empty() {
    project.part_names()
  } else {
    project.validate_parts(part_names)?;
    let mut targets = BTreeSet::new();
    for name in part_names {
      let name = name.as_ref();
      targets.insert(name.to_string());
      targets.extend(project.graph().reverse_dependents(name)?);
    }
    targets
  };

  let store = StateStore::new(project.paths().clone());
  for name in &targets {
    clean_part(project, &store, name, step)?;
    report.cleaned.insert(name.clone());
  }

  reclaim(project, &store, &mut report)?;
  Ok(report)
}

/// Undo `step` and every later step of one part, leaving shared files that
/// other parts still claim.
pub(super) fn clean_part(project: &Project, store: &StateStore, name: &str, step: Step) -> Result<(), LifecycleError> {
  let paths = project.paths();
  let dirs = paths.part(name);

  for current in step.and_later().rev() {
    match current {
      Step::Strip => remove_shared(project, store, name, Step::Strip, &paths.strip_dir())?,
      Step::Stage => remove_shared(project, store, name, Step::Stage, &paths.stage_dir())?,
      Step::Build => {
        remove(&dirs.install)?;
        remove(&dirs.build)?;
      }
      Step::Pull => remove(&dirs.src)?,
    }
    store.forget(name, current)?;
  }

  info!(part = name, %step, "cleaned");
  remove_empty(&dirs.base)?;
  Ok(())
}

/// Remove what `part` placed in a shared area, keeping anything another
/// part's record still claims.
fn remove_shared(project: &Project, store: &StateStore, part: &str, step: Step, area: &Path) -> Result<(), LifecycleError> {
  let Some(record) = store.load(part, step)? else {
    return Ok(());
  };

  let mut others: Vec<StateRecord> = Vec::new();
  for other in project.parts().iter().filter(|p| p.name() != part) {
    if let Some(r) = store.load(other.name(), step)? {
      others.push(r);
    }
  }
  let claimed = |path: &str| others.iter().any(|r| r.claims(path));

  for file in record.files.iter().filter(|f| !claimed(f.as_str())) {
    remove(&area.join(file))?;
  }

  let mut directories: Vec<&String> = record.directories.iter().filter(|d| !claimed(d.as_str())).collect();
  directories.sort_by_key(|d| std::cmp::Reverse(d.matches('/').count()));
  for dir in directories {
    remove_empty(&area.join(dir))?;
  }

  debug!(part, %step, files = record.files.len(), "removed shared contents");
  Ok(())
}

/// Remove shared directories that are empty or that no part has reached.
fn reclaim(project: &Project, store: &StateStore, report: &mut CleanReport) -> Result<(), LifecycleError> {
  let paths = project.paths();
  let parts_dir = paths.parts_dir();
  let stage_dir = paths.stage_dir();
  let strip_dir = paths.strip_dir();

  for dir in [&parts_dir, &stage_dir, &strip_dir] {
    if remove_empty(dir)? {
      report.removed.push(dir.clone());
    }
  }

  let mut highest: Option<Step> = None;
  for part in project.parts() {
    highest = highest.max(store.last_step(part.name())?);
  }

  if highest.is_none() && parts_dir.exists() && !paths.local_plugins_dir().exists() {
    info!("cleaning up parts directory");
    remove(&parts_dir)?;
    report.removed.push(parts_dir);
  }
  if highest < Some(Step::Stage) && stage_dir.exists() {
    info!("cleaning up staging area");
    remove(&stage_dir)?;
    report.removed.push(stage_dir);
  }
  if highest < Some(Step::Strip) && strip_dir.exists() {
    info!("cleaning up stripping area");
    remove(&strip_dir)?;
    report.removed.push(strip_dir);
  }
  Ok(())
}

fn remove(path: &Path) -> Result<(), LifecycleError> {
  remove_path(path).map_err(|e| LifecycleError::Remove {
    path: path.to_path_buf(),
    source: e,
  })
}

fn remove_empty(path: &Path) -> Result<bool, LifecycleError> {
  // Symlinks that point at directories are not ours to remove here.
  if fs::symlink_metadata(path).map(|m| m.file_type().is_symlink()).unwrap_or(false) {
    return Ok(false);
  }
  remove_dir_if_empty(path).map_err(|e| LifecycleError::Remove {
    path: path.to_path_buf(),
    source: e,
  })
}
