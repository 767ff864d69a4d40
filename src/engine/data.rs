use serde_derive::{Deserialize, Serialize};
use std::fmt::{Display, Error as FmtError, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

#[derive(Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize, Clone, Copy)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl Display for TaskId {
  fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), FmtError> {
    self.0.fmt(formatter)
  }
}

impl FromStr for TaskId {
  type Err = ParseIntError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    s.parse().map(Self)
  }
}

/// A single to-do item, serialized exactly as it is persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
  pub id: TaskId,
  pub text: String,
  pub completed: bool,
  pub is_deleted: bool,
}

impl Task {
  pub fn new(id: TaskId, text: impl Into<String>) -> Self {
    Self {
      id,
      text: text.into(),
      completed: false,
      is_deleted: false,
    }
  }
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
  #[default]
  All,
  Active,
  Completed,
  Deleted,
}

impl FilterMode {
  pub const ALL: [Self; 4] = [Self::All, Self::Active, Self::Completed, Self::Deleted];

  pub const fn as_str(self) -> &'static str {
    match self {
      Self::All => "all",
      Self::Active => "active",
      Self::Completed => "completed",
      Self::Deleted => "deleted",
    }
  }

  /// Whether `task` belongs to the view selected by this mode.
  pub const fn admits(self, task: &Task) -> bool {
    match self {
      Self::Deleted => task.is_deleted,
      _ if task.is_deleted => false,
      Self::All => true,
      Self::Active => !task.completed,
      Self::Completed => task.completed,
    }
  }
}

impl Display for FilterMode {
  fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), FmtError> {
    formatter.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter `{0}`, expected one of all, active, completed, deleted")]
pub struct ParseFilterModeError(String);

impl FromStr for FilterMode {
  type Err = ParseFilterModeError;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseFilterModeError(s.to_owned()))
  }
}
