//! Atomic file write helpers.
//!
//! Temp file + rename, so a reader never observes a half-written decision
//! file. Files are created owner-only (0o600 on Unix) and synced before the
//! rename. On Windows, rename-over-existing fails, so the old file is moved
//! aside first; a crash inside that window leaves a `.bak` that
//! [`recover_bak_file`] puts back on the next open.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

/// Restore `path` from `path.bak` if an earlier write was interrupted.
pub fn recover_bak_file(path: &Path) {
    let backup = backup_path(path);
    if path.exists() || !backup.exists() {
        return;
    }
    match fs::rename(&backup, path) {
        Ok(()) => tracing::warn!(
            path = %path.display(),
            "Recovered .bak file from interrupted atomic write"
        ),
        Err(e) => tracing::warn!(path = %path.display(), "Failed to recover .bak file: {e}"),
    }
}

pub fn atomic_write(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(parent)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
    }
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    let Err(first) = tmp.persist(path) else {
        return Ok(());
    };
    if !path.exists() {
        return Err(first.error);
    }

    let backup = backup_path(path);
    let _ = fs::remove_file(&backup);
    fs::rename(path, &backup)?;
    if let Err(second) = first.file.persist(path) {
        let _ = fs::rename(&backup, path);
        return Err(second.error);
    }
    if let Err(e) = fs::remove_file(&backup) {
        tracing::warn!(path = %backup.display(), "Failed to remove .bak after atomic write: {e}");
    }
    Ok(())
}
