//! Storage layer for dms-gui
//!
//! SQLite store behind an r2d2 pool, with a versioned schema-migration
//! engine that creates and forward-patches the dms-gui tables at startup.

pub mod classifier;
mod error;
pub mod executor;
mod lock;
pub mod registry;
mod runner;
pub mod schema;
mod storage;
#[cfg(test)]
mod tests;
mod version_store;

pub use classifier::{BenignReason, ExecutionOutcome, FailureClassifier, SqliteClassifier, Verdict};
pub use error::{Result, StorageError};
pub use executor::{ExecError, Params, SqliteExecutor, StatementExecutor};
pub use lock::MigrationLock;
pub use registry::{Namespace, Patch, RegistryError, SchemaRegistry};
pub use runner::{
    InitReport, MigrateReport, Migrator, NamespaceReport, NamespaceState, NamespaceStatus,
    SkippedStatement, UpdateReport,
};
pub use schema::SchemaContext;
pub use storage::Storage;
pub use version_store::VersionStore;
