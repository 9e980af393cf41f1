//! Installation identifier providers.
//!
//! The registration server only needs an opaque string. Which string is a
//! platform concern, selected once at startup.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use waypoint_utils::{atomic_write, ensure_secure_dir};

/// File name of the persisted vendor identifier inside the data directory.
pub const INSTALLATION_ID_FILE_NAME: &str = "installation_id";

/// Supplies the identifier sent as `userData`. Consulted on every attempt.
pub trait IdentifierProvider: Send + Sync {
    fn installation_id(&self) -> String;
}

/// Always returns the same configured value.
#[derive(Debug, Clone)]
pub struct StaticIdentifier(String);

impl StaticIdentifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl IdentifierProvider for StaticIdentifier {
    fn installation_id(&self) -> String {
        self.0.clone()
    }
}

/// Per-install UUID kept next to the decision record.
///
/// Created on first use. If an existing file cannot be read, or a new one
/// cannot be written, a fresh UUID is returned for this attempt only and the
/// file is left as it was.
#[derive(Debug, Clone)]
pub struct VendorIdentifier {
    path: PathBuf,
}

impl VendorIdentifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(INSTALLATION_ID_FILE_NAME))
    }

    /// `Ok(None)` when there is no usable identifier on disk yet.
    fn read_existing(&self) -> io::Result<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let id = content.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }

    fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let written = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => ensure_secure_dir(parent),
            _ => Ok(()),
        }
        .and_then(|()| atomic_write(&self.path, id.as_bytes()));

        if let Err(e) = written {
            tracing::warn!(
                path = %self.path.display(),
                "Failed to persist installation identifier, using an ephemeral one: {e}"
            );
        }
        id
    }
}

impl IdentifierProvider for VendorIdentifier {
    fn installation_id(&self) -> String {
        match self.read_existing() {
            Ok(Some(id)) => id,
            Ok(None) => self.create(),
            Err(e) => {
                // Keep the unreadable file; it may become readable again.
                tracing::warn!(
                    path = %self.path.display(),
                    "Failed to read installation identifier, using an ephemeral one: {e}"
                );
                Uuid::new_v4().to_string()
            }
        }
    }
}
