//! Cross-process migration lock.
//!
//! Holds `BEGIN EXCLUSIVE` on a side SQLite file next to the database.
//! SQLite's file locking makes a second process wait for the busy
//! timeout; the OS drops the lock if the holder dies.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};

use crate::error::StorageError;

/// Guard for exclusive migration access. Released on drop.
#[derive(Debug)]
pub struct MigrationLock {
    conn: Connection,
    path: PathBuf,
}

impl MigrationLock {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, StorageError> {
        let lock_err = |source: rusqlite::Error| match source.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                StorageError::LockTimeout { path: path.to_path_buf(), source }
            },
            _ => StorageError::Lock { path: path.to_path_buf(), source },
        };

        let conn = Connection::open(path).map_err(lock_err)?;
        conn.busy_timeout(timeout).map_err(lock_err)?;
        tracing::debug!(path = %path.display(), timeout_ms = timeout.as_millis(), "Waiting for migration lock");
        conn.execute_batch("BEGIN EXCLUSIVE").map_err(lock_err)?;
        tracing::debug!(path = %path.display(), "Migration lock acquired");

        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MigrationLock {
    fn drop(&mut self) {
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release migration lock");
        } else {
            tracing::debug!(path = %self.path.display(), "Migration lock released");
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn second_holder_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.sqlite3.migrate-lock");

        let first = MigrationLock::acquire(&path, Duration::from_millis(100)).unwrap();
        assert_eq!(first.path(), path);

        let err = MigrationLock::acquire(&path, Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, StorageError::LockTimeout { .. }), "{err}");
    }

    #[test]
    fn lock_is_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.sqlite3.migrate-lock");

        drop(MigrationLock::acquire(&path, Duration::from_millis(100)).unwrap());
        MigrationLock::acquire(&path, Duration::from_millis(100)).unwrap();
    }

    #[test]
    fn unopenable_path_is_a_lock_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("lock");

        let err = MigrationLock::acquire(&path, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, StorageError::Lock { .. }), "{err}");
    }
}
