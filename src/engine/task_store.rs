use serde_derive::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::{Store, StoreError, Task, TaskId};

/// Key the whole collection is persisted under.
pub const STORAGE_KEY: &str = "todos";

// Persisted records are read leniently: older data may lack ids or flags, and
// an id that is not a positive integer counts as missing.
#[derive(Debug, Deserialize)]
pub(crate) struct StoredTask {
  #[serde(default)]
  id: Option<Value>,
  #[serde(default)]
  text: Option<String>,
  #[serde(default)]
  completed: Option<bool>,
  #[serde(default)]
  is_deleted: Option<bool>,
}

/// Owns the authoritative collection and writes it through on every commit.
#[derive(Debug)]
pub struct TaskStore<S: Store> {
  store: S,
  tasks: Vec<Task>,
  // `None` once the id space is used up.
  next_id: Option<u64>,
  save_failed: bool,
}

impl<S: Store> TaskStore<S> {
  /// Loads the collection; ids assigned to legacy records are written back
  /// right away so they stay stable across sessions.
  pub fn open(store: S) -> Self {
    let (tasks, reassigned) = load_counting(&store);
    let next_id = next_id_after(&tasks);
    let mut this = Self {
      store,
      tasks,
      next_id,
      save_failed: false,
    };
    if reassigned > 0 {
      this.persist();
    }
    this
  }

  pub fn tasks(&self) -> &[Task] {
    &self.tasks
  }

  pub fn get(&self, id: TaskId) -> Option<&Task> {
    self.tasks.iter().find(|task| task.id == id)
  }

  /// Hands out the next unused id, or `None` when none is left.
  pub fn allocate_id(&mut self) -> Option<TaskId> {
    let id = self.next_id?;
    self.next_id = id.checked_add(1);
    Some(TaskId(id))
  }

  /// Replaces the collection and persists it.
  ///
  /// A failed write leaves the new collection in place; it is retried with
  /// the next commit.
  pub fn commit(&mut self, tasks: Vec<Task>) {
    self.tasks = tasks;
    self.next_id = self.next_id.zip(next_id_after(&self.tasks)).map(|(a, b)| a.max(b));
    debug!(count = self.tasks.len(), "committed tasks");
    self.persist();
  }

  fn persist(&mut self) {
    match self.save() {
      Ok(()) => self.save_failed = false,
      Err(err) => {
        warn!(%err, "could not persist tasks");
        self.save_failed = true;
      }
    }
  }

  pub fn save(&mut self) -> Result<(), StoreError> {
    let blob = serde_json::to_string(&self.tasks)?;
    self.store.set(STORAGE_KEY, &blob)
  }

  pub const fn last_save_failed(&self) -> bool {
    self.save_failed
  }

  pub const fn backend(&self) -> &S {
    &self.store
  }

  pub fn into_backend(self) -> S {
    self.store
  }
}

/// Reads the persisted collection, falling back to an empty one on any error.
pub fn load<S: Store + ?Sized>(store: &S) -> Vec<Task> {
  load_counting(store).0
}

// Also reports how many records needed a fresh id.
fn load_counting<S: Store + ?Sized>(store: &S) -> (Vec<Task>, usize) {
  match read(store) {
    Ok(loaded) => loaded,
    Err(err) => {
      warn!(%err, "could not load stored tasks, starting empty");
      (Vec::new(), 0)
    }
  }
}

fn read<S: Store + ?Sized>(store: &S) -> Result<(Vec<Task>, usize), StoreError> {
  let Some(blob) = store.get(STORAGE_KEY)? else {
    return Ok((Vec::new(), 0));
  };
  let records: Option<Vec<StoredTask>> = serde_json::from_str(&blob)?;
  Ok(normalize(records.unwrap_or_default(), now_millis()))
}

fn now_millis() -> u64 {
  u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).unwrap_or(0)
}

fn next_id_after(tasks: &[Task]) -> Option<u64> {
  tasks
    .iter()
    .map(|task| task.id.0)
    .max()
    .map_or(Some(1), |max| max.checked_add(1))
}

/// Gives every record a unique id and reports how many were assigned.
///
/// Records without a usable id (or with `0`, or repeating an earlier id) get
/// `base + position`, where `base` lies above every id already present. When
/// that would overflow or collide, the lowest free id is taken instead.
pub(crate) fn normalize(records: Vec<StoredTask>, now_ms: u64) -> (Vec<Task>, usize) {
  let mut kept = HashSet::with_capacity(records.len());
  let keep: Vec<bool> = records
    .iter()
    .map(|r| r.id().is_some_and(|id| kept.insert(id)))
    .collect();
  let base = kept
    .iter()
    .max()
    .map_or(Some(now_ms), |max| max.checked_add(1).map(|above| above.max(now_ms)));
  let mut taken = kept;
  let mut lowest_free = 1_u64;
  let mut reassigned = 0_usize;
  let tasks = records
    .into_iter()
    .zip(keep)
    .enumerate()
    .map(|(position, (record, keep))| {
      let id = match record.id() {
        Some(id) if keep => id,
        _ => {
          reassigned += 1;
          let offset = u64::try_from(position).ok();
          match base.zip(offset).and_then(|(b, o)| b.checked_add(o)) {
            Some(id) if id != 0 && taken.insert(id) => id,
            _ => {
              while taken.contains(&lowest_free) {
                lowest_free += 1;
              }
              taken.insert(lowest_free);
              lowest_free
            }
          }
        }
      };
      Task {
        id: TaskId(id),
        text: record.text.unwrap_or_default(),
        completed: record.completed.unwrap_or(false),
        is_deleted: record.is_deleted.unwrap_or(false),
      }
    })
    .collect();
  if reassigned > 0 {
    info!(reassigned, ?base, "assigned ids to stored tasks");
  }
  (tasks, reassigned)
}

impl StoredTask {
  fn id(&self) -> Option<u64> {
    self.id.as_ref().and_then(Value::as_u64).filter(|&id| id != 0)
  }
}
