use super::{FilterMode, Task};

/// Tasks shown under `mode`, in insertion order.
pub fn visible(tasks: &[Task], mode: FilterMode) -> Vec<Task> {
  tasks
    .iter()
    .filter(|task| mode.admits(task))
    .cloned()
    .collect()
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Counts {
  pub all: usize,
  pub active: usize,
  pub completed: usize,
  pub deleted: usize,
}

impl Counts {
  pub const fn get(&self, mode: FilterMode) -> usize {
    match mode {
      FilterMode::All => self.all,
      FilterMode::Active => self.active,
      FilterMode::Completed => self.completed,
      FilterMode::Deleted => self.deleted,
    }
  }
}

pub fn counts(tasks: &[Task]) -> Counts {
  tasks.iter().fold(Counts::default(), |mut counts, task| {
    if task.is_deleted {
      counts.deleted += 1;
    } else {
      counts.all += 1;
      if task.completed {
        counts.completed += 1;
      } else {
        counts.active += 1;
      }
    }
    counts
  })
}
