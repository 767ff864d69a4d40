use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("storage io error: {0}")]
  Io(#[from] io::Error),
  #[error("could not encode or decode stored tasks: {0}")]
  Json(#[from] serde_json::Error),
}

/// Durable key-value storage for string blobs.
///
/// The tracker keeps its whole collection under a single key and reads it
/// once at start-up; every committed mutation rewrites it.
pub trait Store {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for &mut S {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    (**self).get(key)
  }

  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    (**self).set(key, value)
  }
}
