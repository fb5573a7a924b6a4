//! Per-namespace schema versions, kept as immutable rows of `settings`.
//!
//! A version lives at `name = 'DB_VERSION_<namespace>'`, `isMutable = 0`,
//! keyed together with its scope. Create scripts seed the row; only the
//! migration runner advances it.

use dmsgui_core::constants::{IS_IMMUTABLE, VERSION_KEY_PREFIX};

use crate::executor::{ExecError, Params, StatementExecutor};
use crate::schema::sql_literal;

const READ_SQL: &str =
    "SELECT value FROM settings WHERE isMutable = 0 AND scope = ?1 AND name = ?2";

const WRITE_SQL: &str =
    "REPLACE INTO settings (name, value, scope, isMutable) VALUES (?1, ?2, ?3, 0)";

#[derive(Debug, Clone, Copy, Default)]
pub struct VersionStore;

impl VersionStore {
    /// `settings.name` holding the version of `namespace`.
    pub fn key(namespace: &str) -> String {
        format!("{VERSION_KEY_PREFIX}{namespace}")
    }

    /// Recorded version, `None` when the namespace has no row in `scope`.
    ///
    /// Errors are returned untouched; on a store that predates the
    /// `scope`/`isMutable` columns this fails with `no such column`.
    pub fn read<E>(executor: &E, namespace: &str, scope: &str) -> Result<Option<String>, ExecError>
    where
        E: StatementExecutor + ?Sized,
    {
        let key = Self::key(namespace);
        executor.query_value(READ_SQL, Params::texts([scope, key.as_str()]))
    }

    pub fn write<E>(executor: &E, namespace: &str, scope: &str, version: &str) -> Result<(), ExecError>
    where
        E: StatementExecutor + ?Sized,
    {
        executor.execute(
            WRITE_SQL,
            Params::texts([Self::key(namespace), version.to_owned(), scope.to_owned()]),
        )?;
        Ok(())
    }

    /// Seed row for a create script. `INSERT OR IGNORE` keeps an existing
    /// version when the script is replayed.
    pub fn seed_statement(namespace: &str, scope: &str, version: &str) -> String {
        format!(
            "INSERT OR IGNORE INTO settings (name, value, scope, isMutable) VALUES ({}, {}, {}, {IS_IMMUTABLE});",
            sql_literal(&Self::key(namespace)),
            sql_literal(version),
            sql_literal(scope),
        )
    }
}
