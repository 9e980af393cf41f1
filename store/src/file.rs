//! JSON-file backend.
//!
//! The whole key set lives in one small JSON object that is rewritten
//! atomically on every change. The in-memory copy is only updated after the
//! file write succeeded, so memory never runs ahead of disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use waypoint_utils::{atomic_write, ensure_secure_dir, recover_bak_file};

use crate::StoreError;
use crate::backend::{Entries, KeyValueStore, ScalarValue, apply};

/// File name of the decision record inside the data directory.
pub const DECISION_FILE_NAME: &str = "decision.json";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// Never fails: a missing file is an empty store and an unreadable or
    /// corrupt file is logged and treated as empty. Errors surface on write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        recover_bak_file(&path);
        let entries = load_entries(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Open `decision.json` inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::open(data_dir.join(DECISION_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &Entries) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_secure_dir(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let bytes = serde_json::to_vec_pretty(entries).map_err(StoreError::Encode)?;
        atomic_write(&self.path, &bytes).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn update(&self, change: impl FnOnce(&mut Entries)) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        change(&mut next);
        if next == *entries {
            return Ok(());
        }
        self.write(&next)?;
        *entries = next;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Entries {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Entries::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to read decision store: {e}");
            return Entries::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                "Decision store is corrupt, starting empty: {e}"
            );
            Entries::new()
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<ScalarValue> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Option<ScalarValue>) -> Result<(), StoreError> {
        self.update(|entries| apply(entries, key, value))
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|entries| {
            for key in keys {
                entries.remove(*key);
            }
        })
    }
}
