use std::mem::replace;
use tracing::{debug, warn};

use super::filter::visible;
use super::{FilterMode, Notification, Notifier, Store, Task, TaskId, TaskStore};

pub const CLEAR_PROMPT: &str = "Are you sure you want to delete all tasks?";
pub const RESTORE_ALL_PROMPT: &str = "Restore all items from trash?";

/// Yes/no gate in front of the destructive bulk operations.
pub trait Confirm {
  fn confirm(&mut self, prompt: &str) -> bool;
}

impl Confirm for bool {
  fn confirm(&mut self, _prompt: &str) -> bool {
    *self
  }
}

#[derive(Debug)]
pub struct ConfirmWith<F>(pub F);

impl<F: FnMut(&str) -> bool> Confirm for ConfirmWith<F> {
  fn confirm(&mut self, prompt: &str) -> bool {
    (self.0)(prompt)
  }
}

pub trait Erledigt {
  /// Appends a task; blank text is ignored, as is any add once the id space
  /// is used up.
  fn add(&mut self, text: &str) -> Option<TaskId>;
  fn toggle(&mut self, id: TaskId) -> bool;
  fn delete(&mut self, id: TaskId) -> bool;
  fn restore(&mut self, id: TaskId) -> bool;
  /// Replaces the text unless it is blank or unchanged after trimming.
  fn edit(&mut self, id: TaskId, text: &str) -> bool;
  fn trash_all<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize>;
  fn purge_trash<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize>;
  fn make_all_done(&mut self) -> usize;
  fn make_all_active(&mut self) -> usize;
  fn restore_all<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize>;
  fn set_filter(&mut self, mode: FilterMode);
  fn filter(&self) -> FilterMode;
  fn tasks(&self) -> &[Task];

  fn get(&self, id: TaskId) -> Option<&Task> {
    self.tasks().iter().find(|task| task.id == id)
  }

  fn visible(&self) -> Vec<Task> {
    visible(self.tasks(), self.filter())
  }

  /// Purges the trash while the deleted view is selected, trashes
  /// everything otherwise.
  fn clear_all<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize> {
    if self.filter() == FilterMode::Deleted {
      self.purge_trash(confirm)
    } else {
      self.trash_all(confirm)
    }
  }
}

#[derive(Debug)]
pub struct Tracker<S: Store, N: Notifier> {
  store: TaskStore<S>,
  notifier: N,
  filter: FilterMode,
}

pub fn new<S: Store, N: Notifier>(store: S, notifier: N) -> Tracker<S, N> {
  Tracker::new(store, notifier)
}

impl<S: Store, N: Notifier> Tracker<S, N> {
  pub fn new(store: S, notifier: N) -> Self {
    Self {
      store: TaskStore::open(store),
      notifier,
      filter: FilterMode::default(),
    }
  }

  pub const fn store(&self) -> &TaskStore<S> {
    &self.store
  }

  pub const fn notifier(&self) -> &N {
    &self.notifier
  }

  pub fn notifier_mut(&mut self) -> &mut N {
    &mut self.notifier
  }

  pub fn into_store(self) -> S {
    self.store.into_backend()
  }

  fn emit(&mut self, notification: Notification) {
    debug!(level = %notification.level, message = %notification.message, "notify");
    self.notifier.notify(notification);
  }

  // `change` returns `None` to leave the collection untouched.
  fn update<T>(&mut self, id: TaskId, change: impl FnOnce(&mut Task) -> Option<T>) -> Option<T> {
    let mut next = self.store.tasks().to_vec();
    let outcome = change(next.iter_mut().find(|task| task.id == id)?)?;
    self.store.commit(next);
    Some(outcome)
  }

  fn update_all(&mut self, mut change: impl FnMut(&mut Task) -> bool) -> usize {
    let mut next = self.store.tasks().to_vec();
    let changed = next.iter_mut().fold(0, |n, task| n + usize::from(change(task)));
    self.store.commit(next);
    changed
  }
}

impl<S: Store, N: Notifier> Erledigt for Tracker<S, N> {
  fn add(&mut self, text: &str) -> Option<TaskId> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }
    let Some(id) = self.store.allocate_id() else {
      warn!("no task ids left, not adding");
      return None;
    };
    let mut next = self.store.tasks().to_vec();
    next.push(Task::new(id, text));
    self.store.commit(next);
    debug!(%id, "added task");
    self.emit(Notification::success(format!("Added \"{text}\"")));
    Some(id)
  }

  fn toggle(&mut self, id: TaskId) -> bool {
    let outcome = self.update(id, |task| {
      if task.is_deleted {
        return None;
      }
      task.completed = !task.completed;
      Some((task.completed, task.text.clone()))
    });
    match outcome {
      Some((true, text)) => self.emit(Notification::info(format!("Completed \"{text}\""))),
      Some((false, text)) => self.emit(Notification::info(format!("Marked \"{text}\" active"))),
      None => return false,
    }
    true
  }

  fn delete(&mut self, id: TaskId) -> bool {
    let Some(text) = self.update(id, |task| {
      task.is_deleted = true;
      Some(task.text.clone())
    }) else {
      return false;
    };
    self.emit(Notification::warning(format!("Deleted \"{text}\"")));
    true
  }

  fn restore(&mut self, id: TaskId) -> bool {
    let Some(text) = self.update(id, |task| {
      task.is_deleted = false;
      Some(task.text.clone())
    }) else {
      return false;
    };
    self.emit(Notification::success(format!("Restored \"{text}\"")));
    true
  }

  fn edit(&mut self, id: TaskId, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
      return false;
    }
    let Some(old) = self.update(id, |task| {
      if task.is_deleted || task.text.trim() == text {
        return None;
      }
      Some(replace(&mut task.text, text.to_owned()))
    }) else {
      return false;
    };
    self.emit(Notification::info(format!("Updated \"{old}\" → \"{text}\"")));
    true
  }

  fn trash_all<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize> {
    if !confirm.confirm(CLEAR_PROMPT) {
      debug!("trash all declined");
      return None;
    }
    let trashed = self.update_all(|task| !replace(&mut task.is_deleted, true));
    self.emit(Notification::warning("Moved all items to trash"));
    Some(trashed)
  }

  fn purge_trash<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize> {
    if !confirm.confirm(CLEAR_PROMPT) {
      debug!("purge declined");
      return None;
    }
    let kept: Vec<Task> = self
      .store
      .tasks()
      .iter()
      .filter(|task| !task.is_deleted)
      .cloned()
      .collect();
    let purged = self.store.tasks().len() - kept.len();
    self.store.commit(kept);
    debug!(purged, "purged trash");
    self.emit(Notification::warning(
      "Permanently deleted all items from trash",
    ));
    Some(purged)
  }

  fn make_all_done(&mut self) -> usize {
    let changed = self.update_all(|task| !task.is_deleted && !replace(&mut task.completed, true));
    self.emit(Notification::success("Marked all tasks as complete"));
    changed
  }

  fn make_all_active(&mut self) -> usize {
    let changed = self.update_all(|task| !task.is_deleted && replace(&mut task.completed, false));
    self.emit(Notification::info("Marked all tasks as active"));
    changed
  }

  fn restore_all<C: Confirm + ?Sized>(&mut self, confirm: &mut C) -> Option<usize> {
    if !confirm.confirm(RESTORE_ALL_PROMPT) {
      debug!("restore all declined");
      return None;
    }
    let restored = self.update_all(|task| replace(&mut task.is_deleted, false));
    self.emit(Notification::success("Restored all items from trash"));
    Some(restored)
  }

  fn set_filter(&mut self, mode: FilterMode) {
    self.filter = mode;
  }

  fn filter(&self) -> FilterMode {
    self.filter
  }

  fn tasks(&self) -> &[Task] {
    self.store.tasks()
  }
}
