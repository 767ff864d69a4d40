use serde_derive::{Deserialize, Serialize};
use std::fmt::{Display, Error as FmtError, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Success,
  Info,
  Warning,
}

impl Display for Level {
  fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), FmtError> {
    formatter.write_str(match self {
      Self::Success => "success",
      Self::Info => "info",
      Self::Warning => "warning",
    })
  }
}

/// Describes the outcome of one mutation for whoever displays it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub level: Level,
  pub message: String,
}

impl Notification {
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      level: Level::Success,
      message: message.into(),
    }
  }

  pub fn info(message: impl Into<String>) -> Self {
    Self {
      level: Level::Info,
      message: message.into(),
    }
  }

  pub fn warning(message: impl Into<String>) -> Self {
    Self {
      level: Level::Warning,
      message: message.into(),
    }
  }
}

impl Display for Notification {
  fn fmt(&self, formatter: &mut Formatter<'_>) -> Result<(), FmtError> {
    write!(formatter, "[{}] {}", self.level, self.message)
  }
}

pub trait Notifier {
  fn notify(&mut self, notification: Notification);
}

impl Notifier for Vec<Notification> {
  fn notify(&mut self, notification: Notification) {
    self.push(notification);
  }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
  fn notify(&mut self, notification: Notification) {
    (**self).notify(notification);
  }
}
