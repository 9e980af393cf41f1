//! Scalar key/value backends.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A single persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Text(String),
}

/// Get/set of scalar values, synchronous and durable once `set` returns.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<ScalarValue>;

    /// Write `value` under `key`. `None` removes the key.
    fn set(&self, key: &str, value: Option<ScalarValue>) -> Result<(), StoreError>;

    /// Remove several keys in one write.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StoreError> {
        for key in keys {
            self.set(key, None)?;
        }
        Ok(())
    }

    /// A value of the wrong type reads as absent.
    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            ScalarValue::Bool(value) => Some(value),
            ScalarValue::Text(_) => None,
        }
    }

    /// A value of the wrong type reads as absent.
    fn get_text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            ScalarValue::Text(value) => Some(value),
            ScalarValue::Bool(_) => None,
        }
    }
}

pub(crate) type Entries = BTreeMap<String, ScalarValue>;

pub(crate) fn apply(entries: &mut Entries, key: &str, value: Option<ScalarValue>) {
    match value {
        Some(value) => {
            entries.insert(key.to_string(), value);
        }
        None => {
            entries.remove(key);
        }
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<ScalarValue> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Option<ScalarValue>) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut entries, key, value);
        Ok(())
    }
}
