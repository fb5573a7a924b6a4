//! Statement executor: the only code that talks to SQLite directly.
//!
//! The migration engine never touches a connection; it hands raw SQL to a
//! [`StatementExecutor`] and gets back either a row count or an
//! [`ExecError`] carrying the store's untouched error text.

use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{Connection, ErrorCode, OptionalExtension as _, ToSql, params_from_iter};
use thiserror::Error;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Structured executor failure.
///
/// `message` is the raw store text (`duplicate column name: salt`); the
/// failure classifier depends on its exact shape, so it is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ExecError {
    pub code: String,
    pub message: String,
}

impl ExecError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

fn error_code_name(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::InternalMalfunction => "SQLITE_INTERNAL",
        ErrorCode::PermissionDenied => "SQLITE_PERM",
        ErrorCode::OperationAborted => "SQLITE_ABORT",
        ErrorCode::DatabaseBusy => "SQLITE_BUSY",
        ErrorCode::DatabaseLocked => "SQLITE_LOCKED",
        ErrorCode::OutOfMemory => "SQLITE_NOMEM",
        ErrorCode::ReadOnly => "SQLITE_READONLY",
        ErrorCode::OperationInterrupted => "SQLITE_INTERRUPT",
        ErrorCode::SystemIoFailure => "SQLITE_IOERR",
        ErrorCode::DatabaseCorrupt => "SQLITE_CORRUPT",
        ErrorCode::NotFound => "SQLITE_NOTFOUND",
        ErrorCode::DiskFull => "SQLITE_FULL",
        ErrorCode::CannotOpen => "SQLITE_CANTOPEN",
        ErrorCode::FileLockingProtocolFailed => "SQLITE_PROTOCOL",
        ErrorCode::SchemaChanged => "SQLITE_SCHEMA",
        ErrorCode::TooBig => "SQLITE_TOOBIG",
        ErrorCode::ConstraintViolation => "SQLITE_CONSTRAINT",
        ErrorCode::TypeMismatch => "SQLITE_MISMATCH",
        ErrorCode::ApiMisuse => "SQLITE_MISUSE",
        ErrorCode::NoLargeFileSupport => "SQLITE_NOLFS",
        ErrorCode::AuthorizationForStatementDenied => "SQLITE_AUTH",
        ErrorCode::ParameterOutOfRange => "SQLITE_RANGE",
        ErrorCode::NotADatabase => "SQLITE_NOTADB",
        _ => "SQLITE_ERROR",
    }
}

impl From<rusqlite::Error> for ExecError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            // Prepare-time failures: rusqlite's Display appends the SQL and offset.
            rusqlite::Error::SqlInputError { error, msg, .. } => {
                Self::new(error_code_name(error.code), msg)
            },
            rusqlite::Error::SqliteFailure(error, Some(msg)) => Self::new(error_code_name(error.code), msg),
            other => {
                let code = other.sqlite_error_code().map_or("RUSQLITE", error_code_name);
                Self::new(code, other.to_string())
            },
        }
    }
}

impl From<r2d2::Error> for ExecError {
    fn from(err: r2d2::Error) -> Self {
        Self::new("POOL", err.to_string())
    }
}

/// Parameters bound to a single statement execution.
///
/// Named keys carry their sigil (`@scope`, `:name`), as written in the SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Params {
    /// Positional text parameters, the common case for version rows.
    pub fn texts<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Positional(values.into_iter().map(|v| Value::Text(v.into())).collect())
    }
}

/// Bind `Params` to whatever rusqlite call `$body` makes with `$bound`.
macro_rules! with_params {
    ($params:expr, |$bound:ident| $body:expr) => {
        match $params {
            Params::None => {
                let $bound = rusqlite::params![];
                $body
            },
            Params::Positional(values) => {
                let $bound = params_from_iter(values.iter());
                $body
            },
            Params::Named(pairs) => {
                let named: Vec<(&str, &dyn ToSql)> =
                    pairs.iter().map(|(k, v)| (k.as_str(), v as &dyn ToSql)).collect();
                let $bound = named.as_slice();
                $body
            },
        }
    };
}

/// Runs raw SQL against the store.
pub trait StatementExecutor {
    /// Run one statement in autocommit mode; returns affected rows.
    fn execute(&self, sql: &str, params: Params) -> Result<usize, ExecError>;

    /// Run one statement once per parameter set, all inside one transaction.
    fn execute_many(&self, sql: &str, param_sets: &[Params]) -> Result<usize, ExecError>;

    /// Run a multi-statement script as a single transaction.
    fn execute_script(&self, script: &str) -> Result<(), ExecError>;

    /// First column of the first row rendered as text, `None` when there is
    /// no row or the value is NULL.
    fn query_value(&self, sql: &str, params: Params) -> Result<Option<String>, ExecError>;
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(n) => Some(n.to_string()),
        Value::Real(n) => Some(n.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

/// Connection initializer for concurrency settings
fn init_connection(conn: &mut Connection, busy_timeout: Duration) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// [`StatementExecutor`] over an r2d2 pool of SQLite connections.
#[derive(Clone, Debug)]
pub struct SqliteExecutor {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteExecutor {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }

    /// Open a pool on the database file, creating the file if needed.
    pub fn open(db_path: &Path, pool_size: u32, busy_timeout_ms: u64) -> Result<Self, r2d2::Error> {
        let busy_timeout = Duration::from_millis(busy_timeout_ms);
        let manager = SqliteConnectionManager::file(db_path)
            .with_init(move |conn| init_connection(conn, busy_timeout));
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;
        tracing::info!(pool_size, path = %db_path.display(), "SQLite pool opened");
        Ok(Self { pool })
    }

    /// Get a connection from the pool
    pub(crate) fn conn(&self) -> Result<PooledConn, ExecError> {
        Ok(self.pool.get()?)
    }
}

impl StatementExecutor for SqliteExecutor {
    fn execute(&self, sql: &str, params: Params) -> Result<usize, ExecError> {
        tracing::debug!(statement = sql, "execute");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let changes = with_params!(&params, |bound| stmt.execute(bound))?;
        Ok(changes)
    }

    fn execute_many(&self, sql: &str, param_sets: &[Params]) -> Result<usize, ExecError> {
        tracing::debug!(statement = sql, batch = param_sets.len(), "execute_many");
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut changes = 0usize;
        {
            let mut stmt = tx.prepare(sql)?;
            for params in param_sets {
                changes += with_params!(params, |bound| stmt.execute(bound))?;
            }
        }
        tx.commit()?;
        Ok(changes)
    }

    fn execute_script(&self, script: &str) -> Result<(), ExecError> {
        tracing::debug!(statement = script, "execute_script");
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute_batch(script)?;
        tx.commit()?;
        Ok(())
    }

    fn query_value(&self, sql: &str, params: Params) -> Result<Option<String>, ExecError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let value = with_params!(&params, |bound| {
            stmt.query_row(bound, |row| row.get::<_, Value>(0)).optional()
        })?;
        Ok(value.and_then(value_to_text))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn executor() -> (SqliteExecutor, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let executor = SqliteExecutor::open(&temp_dir.path().join("exec.db"), 2, 1000).unwrap();
        (executor, temp_dir)
    }

    #[test]
    fn execute_reports_affected_rows() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE t (name TEXT, value TEXT)", Params::None).unwrap();
        let changes = exec
            .execute("INSERT INTO t (name, value) VALUES (?1, ?2)", Params::texts(["a", "1"]))
            .unwrap();
        assert_eq!(changes, 1);
    }

    #[test]
    fn named_parameters_keep_their_sigil() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE t (name TEXT, scope TEXT)", Params::None).unwrap();
        exec.execute(
            "INSERT INTO t (name, scope) VALUES (@name, @scope)",
            Params::Named(vec![
                ("@name".to_owned(), Value::Text("containerName".to_owned())),
                ("@scope".to_owned(), Value::Text("dms".to_owned())),
            ]),
        )
        .unwrap();
        let scope = exec
            .query_value("SELECT scope FROM t WHERE name = ?1", Params::texts(["containerName"]))
            .unwrap();
        assert_eq!(scope.as_deref(), Some("dms"));
    }

    #[test]
    fn query_value_returns_none_without_rows() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE t (value TEXT)", Params::None).unwrap();
        assert_eq!(exec.query_value("SELECT value FROM t", Params::None).unwrap(), None);
    }

    #[test]
    fn execute_many_is_all_or_nothing() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE t (name TEXT PRIMARY KEY)", Params::None).unwrap();
        let err = exec
            .execute_many(
                "INSERT INTO t (name) VALUES (?1)",
                &[Params::texts(["a"]), Params::texts(["b"]), Params::texts(["a"])],
            )
            .unwrap_err();
        assert_eq!(err.code, "SQLITE_CONSTRAINT");
        let count = exec.query_value("SELECT COUNT(*) FROM t", Params::None).unwrap();
        assert_eq!(count.as_deref(), Some("0"));
    }

    #[test]
    fn execute_script_rolls_back_on_failure() {
        let (exec, _dir) = executor();
        let err = exec
            .execute_script(
                "CREATE TABLE a (id INTEGER PRIMARY KEY);
                 CREATE TABLE a (id INTEGER PRIMARY KEY);",
            )
            .unwrap_err();
        assert_eq!(err, ExecError::new("SQLITE_ERROR", "table a already exists"));
        // The first CREATE was rolled back with the rest of the script.
        exec.execute("CREATE TABLE a (id INTEGER PRIMARY KEY)", Params::None).unwrap();
    }

    #[test]
    fn error_message_is_raw_store_text() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE logins (id INTEGER PRIMARY KEY, salt TEXT)", Params::None)
            .unwrap();
        let err = exec.execute("ALTER TABLE logins ADD salt TEXT", Params::None).unwrap_err();
        assert_eq!(err, ExecError::new("SQLITE_ERROR", "duplicate column name: salt"));
    }

    #[test]
    fn prepare_failures_keep_raw_text_and_code() {
        let (exec, _dir) = executor();
        exec.execute("CREATE TABLE logins (id INTEGER)", Params::None).unwrap();

        let err = exec.execute_script("CREATE TABLE logins (id INTEGER);").unwrap_err();
        assert_eq!(err, ExecError::new("SQLITE_ERROR", "table logins already exists"));

        let err = exec.execute("ALTER TABLE logins DROP COLUMN password", Params::None).unwrap_err();
        assert_eq!(err, ExecError::new("SQLITE_ERROR", "no such column: \"password\""));

        let err = exec.query_value("SELECT nope FROM logins", Params::None).unwrap_err();
        assert_eq!(err, ExecError::new("SQLITE_ERROR", "no such column: nope"));
    }
}
