//! Durable record of the one-time registration outcome.
//!
//! [`DecisionStore`] is the only component that knows how a
//! [`RegistrationOutcome`] maps onto storage: two scalar entries under fixed
//! keys in whatever [`KeyValueStore`] backs it.
//!
//! | Key | Type | Meaning |
//! |-----|------|---------|
//! | `registration_attempted` | bool | a definitive answer was recorded |
//! | `cached_content_url` | string | location granted by the server, if any |

mod backend;
mod file;

use std::path::PathBuf;
use std::sync::Arc;

use waypoint_types::{ContentLocation, RegistrationOutcome};

pub use backend::{KeyValueStore, MemoryStore, ScalarValue};
pub use file::{DECISION_FILE_NAME, FileStore};

pub const ATTEMPTED_KEY: &str = "registration_attempted";
pub const CONTENT_LOCATION_KEY: &str = "cached_content_url";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode decision record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Typed view over the registration keys.
///
/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct DecisionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for DecisionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionStore").finish_non_exhaustive()
    }
}

impl DecisionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read the current outcome. Absent keys read as defaults.
    #[must_use]
    pub fn outcome(&self) -> RegistrationOutcome {
        let attempted = self.backend.get_bool(ATTEMPTED_KEY).unwrap_or(false);
        let content_location = self
            .backend
            .get_text(CONTENT_LOCATION_KEY)
            .and_then(|value| ContentLocation::new(value).ok());
        RegistrationOutcome {
            attempted,
            content_location,
        }
    }

    /// Record a definitive registration answer.
    ///
    /// Writes (or clears) the location and always sets the attempted flag.
    /// The location is written first so a failure in between never leaves
    /// `attempted == true` next to a stale location.
    pub fn record_outcome(&self, location: Option<&ContentLocation>) -> Result<(), StoreError> {
        tracing::info!(
            location = location.map_or("<none>", ContentLocation::as_str),
            "Recording registration outcome"
        );
        let value = location.map(|l| ScalarValue::Text(l.as_str().to_string()));
        self.backend.set(CONTENT_LOCATION_KEY, value)?;
        self.backend
            .set(ATTEMPTED_KEY, Some(ScalarValue::Bool(true)))
    }

    /// Forget the recorded outcome; the next resolution behaves like a first launch.
    pub fn reset(&self) -> Result<(), StoreError> {
        tracing::info!("Clearing recorded registration outcome");
        self.backend
            .remove_all(&[CONTENT_LOCATION_KEY, ATTEMPTED_KEY])
    }
}
