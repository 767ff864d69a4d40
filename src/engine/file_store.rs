use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::{Store, StoreError};

/// Keeps every key in its own `<key>.json` file below `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn path_for(&self, key: &str) -> PathBuf {
    self.dir.join(format!("{key}.json"))
  }
}

impl Store for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  // Readers never observe a half-written file: write to a sibling temp file,
  // then rename over the target.
  fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
    fs::create_dir_all(&self.dir)?;
    let mut tmp = NamedTempFile::new_in(&self.dir)?;
    tmp.write_all(value.as_bytes())?;
    tmp.flush()?;
    tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::FileStore;
  use crate::engine::Store;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn missing_file_reads_as_none() {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    assert_eq!(store.get("todos").unwrap(), None);
  }

  #[test]
  fn set_creates_directory_and_replaces_content() {
    let tmp = TempDir::new().unwrap();
    let mut store = FileStore::new(tmp.path().join("nested").join("dir"));
    store.set("todos", "[]").unwrap();
    store.set("todos", "[{\"id\":1}]").unwrap();
    assert_eq!(
      fs::read_to_string(store.path_for("todos")).unwrap(),
      "[{\"id\":1}]"
    );
    assert_eq!(store.get("todos").unwrap().as_deref(), Some("[{\"id\":1}]"));
    let leftovers = fs::read_dir(store.dir()).unwrap().count();
    assert_eq!(leftovers, 1);
  }

  #[test]
  fn unreadable_path_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let store = FileStore::new(tmp.path());
    fs::create_dir(store.path_for("todos")).unwrap();
    assert!(store.get("todos").is_err());
  }
}
