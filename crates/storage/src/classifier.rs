//! Failure classification for patch and create-script statements.
//!
//! SQLite has no `ADD COLUMN IF NOT EXISTS` / `DROP COLUMN IF EXISTS`, so
//! idempotency of ALTER-style patches is rebuilt from the store's error
//! text. Matching is by identifier: the name in the statement must equal
//! the name in the error, case-insensitively. A message that merely
//! mentions "column" is never enough.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::executor::ExecError;

/// Identifier, bare or quoted with `"`, `'`, `` ` `` or `[]`.
const IDENT: &str = r#"["'`\[]?(\w+)["'`\]]?"#;

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static ADD_COLUMN_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)ALTER\s+TABLE\s+{IDENT}\s+ADD\s+(?:COLUMN\s+)?{IDENT}")).unwrap()
});

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static DUPLICATE_COLUMN_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)duplicate\s+column\s+name:\s*{IDENT}")).unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static DROP_COLUMN_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)DROP\s+COLUMN\s+{IDENT}")).unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static NO_SUCH_COLUMN_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)no\s+such\s+column[:\s]\s*{IDENT}")).unwrap());

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static CREATE_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)CREATE\s+(?:UNIQUE\s+)?(?:TEMP\s+|TEMPORARY\s+)?(?:TABLE|INDEX)\s+(?:IF\s+NOT\s+EXISTS\s+)?{IDENT}"
    ))
    .unwrap()
});

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static ALREADY_EXISTS_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:table|index)\s+{IDENT}\s+already\s+exists")).unwrap()
});

#[expect(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static UNTRACKED_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)no\s+such\s+(?:column|table)\b").unwrap());

/// Why a failed statement still counts as applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum BenignReason {
    /// `ADD` of a column the table already has.
    ColumnExists(String),
    /// `DROP COLUMN` of a column the table no longer has.
    ColumnMissing(String),
    /// `CREATE` of a table or index that is already there.
    TableExists(String),
}

impl std::fmt::Display for BenignReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnExists(name) => write!(f, "column {name} already exists"),
            Self::ColumnMissing(name) => write!(f, "column {name} already dropped"),
            Self::TableExists(name) => write!(f, "{name} already exists"),
        }
    }
}

/// Classifier decision for a failed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Benign(BenignReason),
    Fatal,
}

/// Decides whether a store failure means "already applied" or "abort".
pub trait FailureClassifier {
    fn classify(&self, statement: &str, error: &ExecError) -> Verdict;

    /// Whether a version read failed only because the table or column
    /// holding versions does not exist yet.
    fn is_untracked(&self, error: &ExecError) -> bool;
}

/// Error-text rules for SQLite's English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteClassifier;

/// Name captured from `statement`, if the error names the same identifier.
fn same_name(
    statement: &str,
    statement_re: &Regex,
    statement_group: usize,
    message: &str,
    error_re: &Regex,
) -> Option<String> {
    let wanted = statement_re.captures(statement)?.get(statement_group)?.as_str();
    let found = error_re.captures(message)?.get(1)?.as_str();
    wanted.eq_ignore_ascii_case(found).then(|| wanted.to_owned())
}

impl FailureClassifier for SqliteClassifier {
    fn classify(&self, statement: &str, error: &ExecError) -> Verdict {
        let message = error.message.as_str();

        // Group 2: group 1 is the table name.
        if let Some(column) =
            same_name(statement, &ADD_COLUMN_STATEMENT, 2, message, &DUPLICATE_COLUMN_ERROR)
        {
            return Verdict::Benign(BenignReason::ColumnExists(column));
        }

        if let Some(column) =
            same_name(statement, &DROP_COLUMN_STATEMENT, 1, message, &NO_SUCH_COLUMN_ERROR)
        {
            return Verdict::Benign(BenignReason::ColumnMissing(column));
        }

        if let Some(existing) = ALREADY_EXISTS_ERROR.captures(message).and_then(|c| c.get(1)) {
            let existing = existing.as_str();
            let created = CREATE_STATEMENT
                .captures_iter(statement)
                .filter_map(|c| c.get(1))
                .any(|name| name.as_str().eq_ignore_ascii_case(existing));
            if created {
                return Verdict::Benign(BenignReason::TableExists(existing.to_owned()));
            }
        }

        Verdict::Fatal
    }

    fn is_untracked(&self, error: &ExecError) -> bool {
        UNTRACKED_ERROR.is_match(&error.message)
    }
}

/// Result of running one statement through the executor and classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    AlreadyApplied(BenignReason),
    Fatal(ExecError),
}

impl ExecutionOutcome {
    pub fn resolve<T, C>(result: Result<T, ExecError>, statement: &str, classifier: &C) -> Self
    where
        C: FailureClassifier + ?Sized,
    {
        match result {
            Ok(_) => Self::Success,
            Err(err) => match classifier.classify(statement, &err) {
                Verdict::Benign(reason) => Self::AlreadyApplied(reason),
                Verdict::Fatal => Self::Fatal(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_error(message: &str) -> ExecError {
        ExecError::new("SQLITE_ERROR", message)
    }

    fn classify(statement: &str, message: &str) -> Verdict {
        SqliteClassifier.classify(statement, &sqlite_error(message))
    }

    #[test]
    fn duplicate_added_column_is_benign() {
        assert_eq!(
            classify("ALTER TABLE logins ADD salt TEXT DEFAULT ''", "duplicate column name: salt"),
            Verdict::Benign(BenignReason::ColumnExists("salt".to_owned()))
        );
        assert_eq!(
            classify("alter table \"logins\" add column \"Hash\" TEXT", "duplicate column name: hash"),
            Verdict::Benign(BenignReason::ColumnExists("Hash".to_owned()))
        );
    }

    #[test]
    fn duplicate_of_a_different_column_is_fatal() {
        assert_eq!(
            classify("ALTER TABLE logins ADD salt TEXT", "duplicate column name: hash"),
            Verdict::Fatal
        );
    }

    #[test]
    fn missing_dropped_column_is_benign() {
        assert_eq!(
            classify("ALTER TABLE logins DROP COLUMN password;", "no such column: \"password\""),
            Verdict::Benign(BenignReason::ColumnMissing("password".to_owned()))
        );
    }

    #[test]
    fn missing_column_outside_a_drop_is_fatal() {
        assert_eq!(
            classify("UPDATE logins SET isAdmin = 1 WHERE password = 'x'", "no such column: password"),
            Verdict::Fatal
        );
        assert_eq!(
            classify("ALTER TABLE logins DROP COLUMN password", "no such column: salt"),
            Verdict::Fatal
        );
    }

    #[test]
    fn existing_table_in_create_script_is_benign() {
        let script = "CREATE TABLE roles (id INTEGER PRIMARY KEY);
            INSERT OR IGNORE INTO settings (name, value) VALUES ('DB_VERSION_roles', '1.2.4');";
        assert_eq!(
            classify(script, "table roles already exists"),
            Verdict::Benign(BenignReason::TableExists("roles".to_owned()))
        );
        assert_eq!(
            classify("CREATE TABLE \"roles\" (id INTEGER)", "table \"roles\" already exists"),
            Verdict::Benign(BenignReason::TableExists("roles".to_owned()))
        );
    }

    #[test]
    fn existing_table_not_created_by_statement_is_fatal() {
        assert_eq!(
            classify("CREATE TABLE roles (id INTEGER)", "table settings already exists"),
            Verdict::Fatal
        );
        assert_eq!(
            classify("INSERT INTO roles VALUES (1)", "table roles already exists"),
            Verdict::Fatal
        );
    }

    #[test]
    fn unrelated_errors_are_fatal() {
        assert_eq!(
            classify("ALTER TABLE nope ADD salt TEXT", "no such table: nope"),
            Verdict::Fatal
        );
        assert_eq!(
            classify("INSERT INTO settings (name) VALUES ('x')", "NOT NULL constraint failed: settings.value"),
            Verdict::Fatal
        );
    }

    #[test]
    fn untracked_reads() {
        assert!(SqliteClassifier.is_untracked(&sqlite_error("no such column: isMutable")));
        assert!(SqliteClassifier.is_untracked(&sqlite_error("no such table: settings")));
        assert!(!SqliteClassifier.is_untracked(&sqlite_error("database is locked")));
    }

    #[test]
    fn resolve_maps_results_to_outcomes() {
        let ok: Result<usize, ExecError> = Ok(1);
        assert_eq!(
            ExecutionOutcome::resolve(ok, "ALTER TABLE logins ADD salt TEXT", &SqliteClassifier),
            ExecutionOutcome::Success
        );

        let dup = Err::<usize, _>(sqlite_error("duplicate column name: salt"));
        assert_eq!(
            ExecutionOutcome::resolve(dup, "ALTER TABLE logins ADD salt TEXT", &SqliteClassifier),
            ExecutionOutcome::AlreadyApplied(BenignReason::ColumnExists("salt".to_owned()))
        );

        let missing = Err::<usize, _>(sqlite_error("no such table: nope"));
        assert_eq!(
            ExecutionOutcome::resolve(missing, "ALTER TABLE nope ADD salt TEXT", &SqliteClassifier),
            ExecutionOutcome::Fatal(sqlite_error("no such table: nope"))
        );
    }
}
