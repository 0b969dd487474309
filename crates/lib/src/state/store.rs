//! On-disk part state.
//!
//! # Storage Layout
//!
//! ```text
//! parts/<name>/state/
//! ├── pull.json
//! ├── build.json
//! ├── stage.json
//! └── strip.json
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::project::ProjectPaths;
use crate::step::Step;

use super::types::{StateError, StateRecord, StepInputs};

/// Per-part, per-step records of completed work.
///
/// The store is the single source of truth for whether a step may be skipped.
/// Records are written atomically and only after the step's filesystem side
/// effects are complete, so an interrupted step is never marked satisfied.
#[derive(Debug, Clone)]
pub struct StateStore {
  paths: ProjectPaths,
}

impl StateStore {
  pub fn new(paths: ProjectPaths) -> Self {
    Self { paths }
  }

  fn state_dir(&self, part: &str) -> PathBuf {
    self.paths.part(part).state
  }

  fn record_path(&self, part: &str, step: Step) -> PathBuf {
    self.state_dir(part).join(format!("{}.json", step))
  }

  /// Load the record for `(part, step)`, `None` if the step never completed.
  pub fn load(&self, part: &str, step: Step) -> Result<Option<StateRecord>, StateError> {
    let path = self.record_path(part, step);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(StateError::Read { path, source: e }),
    };

    let record = serde_json::from_str(&content).map_err(|e| StateError::Parse { path, source: e })?;
    Ok(Some(record))
  }

  /// Persist the record for `(part, step)`.
  ///
  /// Uses atomic write (write to temp, then rename) to prevent corruption.
  pub fn record(&self, part: &str, step: Step, record: &StateRecord) -> Result<(), StateError> {
    let dir = self.state_dir(part);
    fs::create_dir_all(&dir).map_err(|e| StateError::CreateDir {
      path: dir.clone(),
      source: e,
    })?;

    let path = self.record_path(part, step);
    let temp_path = dir.join(format!("{}.json.tmp", step));

    let content = serde_json::to_string_pretty(record).map_err(StateError::Serialize)?;
    fs::write(&temp_path, &content).map_err(|e| StateError::Write {
      path: temp_path.clone(),
      source: e,
    })?;
    fs::rename(&temp_path, &path).map_err(|e| StateError::Write {
      path: path.clone(),
      source: e,
    })?;

    debug!(part, %step, path = %path.display(), "recorded step state");
    Ok(())
  }

  /// Remove the records for `step` and every later step.
  ///
  /// Undoing an earlier step invalidates everything built on top of it. The
  /// state directory is removed once it holds no records.
  pub fn forget(&self, part: &str, step: Step) -> Result<(), StateError> {
    for later in step.and_later() {
      let path = self.record_path(part, later);
      match fs::remove_file(&path) {
        Ok(()) => debug!(part, step = %later, "forgot step state"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(StateError::Remove { path, source: e }),
      }
    }

    let dir = self.state_dir(part);
    if let Ok(mut entries) = fs::read_dir(&dir)
      && entries.next().is_none()
    {
      fs::remove_dir(&dir).map_err(|e| StateError::Remove { path: dir, source: e })?;
    }
    Ok(())
  }

  /// Whether `step` may be skipped for `part`.
  ///
  /// True only when every step up to and including `step` has a record whose
  /// inputs equal the ones in `inputs`. A later step is never satisfied while
  /// an earlier one is not.
  pub fn is_satisfied(&self, part: &str, step: Step, inputs: &StepInputs) -> Result<bool, StateError> {
    for earlier in step.up_to() {
      let Some(record) = self.load(part, earlier)? else {
        return Ok(false);
      };
      let current = inputs.get(&earlier).unwrap_or(&serde_json::Value::Null);
      if &record.inputs != current {
        debug!(part, step = %earlier, "step inputs changed since last run");
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// The latest step with a record for `part`, if any.
  pub fn last_step(&self, part: &str) -> Result<Option<Step>, StateError> {
    for step in Step::ALL.into_iter().rev() {
      if self.record_path(part, step).is_file() {
        return Ok(Some(step));
      }
    }
    Ok(None)
  }
}
