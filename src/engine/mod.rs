mod data;
#[allow(clippy::module_inception)]
mod engine;
mod file_store;
pub mod filter;
mod mem_store;
mod notify;
mod store;
mod task_store;

pub use data::{FilterMode, ParseFilterModeError, Task, TaskId};
pub use engine::{
  new, Confirm, ConfirmWith, Erledigt, Tracker, CLEAR_PROMPT, RESTORE_ALL_PROMPT,
};
pub use file_store::FileStore;
pub use filter::{counts, visible, Counts};
pub use mem_store::MemStore;
pub use notify::{Level, Notification, Notifier};
pub use store::{Store, StoreError};
pub use task_store::{load, TaskStore, STORAGE_KEY};
