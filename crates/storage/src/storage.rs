//! `Storage`: pooled SQLite store plus the dms-gui schema registry.

use std::path::PathBuf;
use std::time::Duration;

use dmsgui_core::Settings;

use crate::error::{Result, StorageError};
use crate::executor::SqliteExecutor;
use crate::lock::MigrationLock;
use crate::registry::SchemaRegistry;
use crate::runner::{MigrateReport, Migrator, NamespaceState};
use crate::schema::{self, SchemaContext};

/// Main storage struct wrapping the `SQLite` connection pool
#[derive(Clone, Debug)]
pub struct Storage {
    executor: SqliteExecutor,
    registry: SchemaRegistry,
    target: String,
    scope: String,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl Storage {
    /// Open the pool without touching the schema.
    pub fn connect(settings: &Settings) -> Result<Self> {
        if let Some(parent) = settings.database.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let executor =
            SqliteExecutor::open(&settings.database, settings.pool_size, settings.busy_timeout_ms)?;
        let registry = schema::registry(&SchemaContext::from(settings))?;

        Ok(Self {
            executor,
            registry,
            target: settings.app_version.clone(),
            scope: settings.default_scope.clone(),
            lock_path: settings.lock_path(),
            lock_timeout: Duration::from_millis(settings.lock_timeout_ms),
        })
    }

    /// Open an existing store for inspection. Never creates the file.
    pub fn open(settings: &Settings) -> Result<Self> {
        if !settings.database.is_file() {
            return Err(StorageError::Missing { path: settings.database.clone() });
        }
        Self::connect(settings)
    }

    /// Open the pool and bring the schema up to the running release.
    /// A fatal migration error aborts construction.
    pub fn new(settings: &Settings) -> Result<Self> {
        let storage = Self::connect(settings)?;
        storage.migrate()?;
        Ok(storage)
    }

    /// Run `init` then `update` while holding the migration lock.
    pub fn migrate(&self) -> Result<MigrateReport> {
        let _lock = MigrationLock::acquire(&self.lock_path, self.lock_timeout)?;
        let report = self.migrator().migrate()?;
        tracing::info!(
            created = report.init.created.len(),
            applied = report.update.applied_count(),
            target_version = %self.target,
            "Storage initialized"
        );
        Ok(report)
    }

    /// Runner over this store. Callers must hold exclusive access while
    /// running `init`/`update` through it directly.
    pub fn migrator(&self) -> Migrator<'_, SqliteExecutor> {
        Migrator::new(&self.executor, &self.registry, self.target.clone()).with_scope(self.scope.clone())
    }

    pub fn get_version(&self, namespace: &str, scope: &str) -> Result<Option<String>> {
        self.migrator().get_version(namespace, scope)
    }

    pub fn status(&self) -> Result<Vec<NamespaceState>> {
        self.migrator().status()
    }

    pub fn executor(&self) -> &SqliteExecutor {
        &self.executor
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn target_version(&self) -> &str {
        &self.target
    }
}
