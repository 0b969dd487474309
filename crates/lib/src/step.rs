//! The fixed lifecycle sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of the part lifecycle.
///
/// Steps are totally ordered: running a step for a part implies every earlier
/// step for that part is already satisfied or runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
  Pull,
  Build,
  Stage,
  Strip,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown step '{0}' (expected one of: pull, build, stage, strip)")]
pub struct UnknownStep(pub String);

impl Step {
  pub const ALL: [Step; 4] = [Step::Pull, Step::Build, Step::Stage, Step::Strip];

  pub fn as_str(&self) -> &'static str {
    match self {
      Step::Pull => "pull",
      Step::Build => "build",
      Step::Stage => "stage",
      Step::Strip => "strip",
    }
  }

  pub fn index(&self) -> usize {
    *self as usize
  }

  /// Steps from the first one up to and including `self`.
  pub fn up_to(self) -> impl DoubleEndedIterator<Item = Step> {
    Step::ALL.into_iter().take(self.index() + 1)
  }

  /// `self` and every step after it.
  pub fn and_later(self) -> impl DoubleEndedIterator<Item = Step> {
    Step::ALL.into_iter().skip(self.index())
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Step {
  type Err = UnknownStep;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pull" => Ok(Step::Pull),
      "build" => Ok(Step::Build),
      "stage" => Ok(Step::Stage),
      "strip" => Ok(Step::Strip),
      other => Err(UnknownStep(other.to_string())),
    }
  }
}
