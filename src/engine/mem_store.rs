use std::collections::HashMap;

use super::{Store, StoreError};

#[derive(Debug, Default, Clone)]
pub struct MemStore {
  entries: HashMap<String, String>,
}

impl MemStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
    let mut store = Self::new();
    store.entries.insert(key.into(), value.into());
    store
  }

  pub fn entry(&self, key: &str) -> Option<&str> {
    self.entries.get(key).map(String::as_str)
  }
}

impl Store for MemStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.entries.get(key).cloned())
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    self.entries.insert(key.to_owned(), value.to_owned());
    Ok(())
  }
}
