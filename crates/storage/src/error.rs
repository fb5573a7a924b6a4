//! Typed error enum for the storage layer.
//!
//! Callers match on the failure mode: a fatal migration names the
//! namespace and the statement that broke, so startup can refuse to
//! continue with a clear message.

use std::path::PathBuf;

use thiserror::Error;

use crate::executor::ExecError;
use crate::registry::RegistryError;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A create script failed for a reason other than "already exists".
    #[error("creating namespace {namespace} failed: {source}")]
    Init {
        namespace: String,
        #[source]
        source: ExecError,
    },

    /// The version row could not be read, and the table is not simply untracked yet.
    #[error("reading version of {namespace} (scope {scope}) failed: {source}")]
    VersionRead {
        namespace: String,
        scope: String,
        #[source]
        source: ExecError,
    },

    /// A patch statement failed and the failure was not an already-applied change.
    #[error("migrating {namespace} to {version} failed at `{statement}`: {source}")]
    Migration {
        namespace: String,
        version: String,
        statement: String,
        #[source]
        source: ExecError,
    },

    /// The patch ran but its version could not be recorded.
    #[error("recording version {version} of {namespace} failed: {source}")]
    VersionWrite {
        namespace: String,
        version: String,
        #[source]
        source: ExecError,
    },

    /// Another process held the migration lock for the whole timeout.
    #[error("migration lock {} is held by another process: {source}", path.display())]
    LockTimeout {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The migration lock file could not be opened or locked.
    #[error("migration lock {} failed: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Inspection was asked for a database file that is not there.
    #[error("database {} does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("invalid schema registry: {0}")]
    Registry(#[from] RegistryError),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this error means the schema is not safe to run against.
    pub fn is_fatal_migration(&self) -> bool {
        matches!(
            self,
            Self::Init { .. }
                | Self::VersionRead { .. }
                | Self::Migration { .. }
                | Self::VersionWrite { .. }
        )
    }

    /// Namespace the failure belongs to, when there is one.
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Init { namespace, .. }
            | Self::VersionRead { namespace, .. }
            | Self::Migration { namespace, .. }
            | Self::VersionWrite { namespace, .. } => Some(namespace),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_error_names_namespace_and_statement() {
        let err = StorageError::Migration {
            namespace: "logins".to_owned(),
            version: "1.0.14".to_owned(),
            statement: "ALTER TABLE nope ADD salt TEXT".to_owned(),
            source: ExecError::new("SQLITE_ERROR", "no such table: nope"),
        };
        assert_eq!(
            err.to_string(),
            "migrating logins to 1.0.14 failed at `ALTER TABLE nope ADD salt TEXT`: SQLITE_ERROR: no such table: nope"
        );
        assert!(err.is_fatal_migration());
        assert_eq!(err.namespace(), Some("logins"));
    }

    #[test]
    fn registry_errors_are_not_migration_failures() {
        let err = StorageError::Registry(RegistryError::EmptyName);
        assert!(!err.is_fatal_migration());
        assert_eq!(err.namespace(), None);
    }
}
