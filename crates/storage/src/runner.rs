//! Migration runner: creates missing namespaces, then walks each
//! namespace's patches forward from its recorded version.
//!
//! Callers must hold exclusive access to the store for the whole run
//! (see [`MigrationLock`](crate::MigrationLock)).

use std::cmp::Ordering;

use dmsgui_core::constants::DEFAULT_SCOPE;
use dmsgui_core::{compare_versions, is_newer};
use serde::Serialize;

use crate::classifier::{
    BenignReason, ExecutionOutcome, FailureClassifier, SqliteClassifier, Verdict,
};
use crate::error::{Result, StorageError};
use crate::executor::{Params, StatementExecutor};
use crate::registry::{Namespace, Patch, SchemaRegistry};
use crate::version_store::VersionStore;

/// Outcome of [`Migrator::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceStatus {
    /// The namespace ships no patches.
    NoPatches,
    /// Recorded version already covers every patch up to the target.
    UpToDate,
    /// At least one patch was applied.
    Patched,
}

/// A patch statement that failed because its change was already there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStatement {
    pub version: String,
    pub statement: String,
    pub reason: BenignReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceReport {
    pub namespace: String,
    /// Version before the run; `None` when untracked.
    pub from: Option<String>,
    /// Version after the run.
    pub to: Option<String>,
    /// Patch versions applied, in order.
    pub applied: Vec<String>,
    pub skipped_statements: Vec<SkippedStatement>,
    pub status: NamespaceStatus,
}

impl NamespaceReport {
    fn unchanged(namespace: &str, version: Option<String>, status: NamespaceStatus) -> Self {
        Self {
            namespace: namespace.to_owned(),
            from: version.clone(),
            to: version,
            applied: Vec::new(),
            skipped_statements: Vec::new(),
            status,
        }
    }
}

/// Outcome of [`Migrator::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub namespaces: Vec<NamespaceReport>,
}

impl UpdateReport {
    /// Number of patches applied across all namespaces.
    pub fn applied_count(&self) -> usize {
        self.namespaces.iter().map(|ns| ns.applied.len()).sum()
    }

    pub fn namespace(&self, name: &str) -> Option<&NamespaceReport> {
        self.namespaces.iter().find(|ns| ns.namespace == name)
    }
}

/// Outcome of [`Migrator::migrate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrateReport {
    pub init: InitReport,
    pub update: UpdateReport,
}

/// Recorded version and pending patches of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceState {
    pub namespace: String,
    pub version: Option<String>,
    pub pending: Vec<String>,
}

/// Applies a [`SchemaRegistry`] to a store through a [`StatementExecutor`].
#[derive(Debug)]
pub struct Migrator<'a, E: ?Sized, C = SqliteClassifier> {
    executor: &'a E,
    registry: &'a SchemaRegistry,
    classifier: C,
    target: String,
    scope: String,
}

impl<'a, E> Migrator<'a, E>
where
    E: StatementExecutor + ?Sized,
{
    pub fn new(executor: &'a E, registry: &'a SchemaRegistry, target: impl Into<String>) -> Self {
        Self {
            executor,
            registry,
            classifier: SqliteClassifier,
            target: target.into(),
            scope: DEFAULT_SCOPE.to_owned(),
        }
    }
}

impl<'a, E, C> Migrator<'a, E, C>
where
    E: StatementExecutor + ?Sized,
    C: FailureClassifier,
{
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    #[must_use]
    pub fn with_classifier<D: FailureClassifier>(self, classifier: D) -> Migrator<'a, E, D> {
        Migrator {
            executor: self.executor,
            registry: self.registry,
            classifier,
            target: self.target,
            scope: self.scope,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Run every create script. A namespace whose table already exists
    /// counts as present; any other failure aborts.
    pub fn init(&self) -> Result<InitReport> {
        let mut report = InitReport::default();

        for namespace in self.registry.namespaces() {
            let name = namespace.name.as_str();
            match self.executor.execute_script(&namespace.create) {
                Ok(()) => {
                    tracing::info!(namespace = name, "Namespace created");
                    report.created.push(namespace.name.clone());
                },
                Err(source) => match self.classifier.classify(&namespace.create, &source) {
                    Verdict::Benign(BenignReason::TableExists(table)) => {
                        tracing::info!(namespace = name, table = %table, "Namespace already present");
                        report.existing.push(namespace.name.clone());
                    },
                    _ => {
                        tracing::error!(namespace = name, error = %source, "Creating namespace failed");
                        return Err(StorageError::Init { namespace: namespace.name.clone(), source });
                    },
                },
            }
        }

        Ok(report)
    }

    /// Apply pending patches, namespace by namespace, in registry order.
    ///
    /// On a fatal statement the failing namespace keeps its last recorded
    /// version and namespaces already processed keep their progress.
    pub fn update(&self) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();
        for namespace in self.registry.namespaces() {
            report.namespaces.push(self.update_namespace(namespace)?);
        }

        let applied = report.applied_count();
        if applied == 0 {
            tracing::info!(target_version = %self.target, "Database schema up to date");
        } else {
            tracing::info!(target_version = %self.target, applied, "Database schema migrated");
        }
        Ok(report)
    }

    /// [`init`](Self::init) followed by [`update`](Self::update).
    pub fn migrate(&self) -> Result<MigrateReport> {
        let init = self.init()?;
        let update = self.update()?;
        Ok(MigrateReport { init, update })
    }

    /// Recorded version of `namespace` in `scope`; `None` when no row exists.
    pub fn get_version(&self, namespace: &str, scope: &str) -> Result<Option<String>> {
        VersionStore::read(self.executor, namespace, scope).map_err(|source| {
            StorageError::VersionRead {
                namespace: namespace.to_owned(),
                scope: scope.to_owned(),
                source,
            }
        })
    }

    /// Per-namespace recorded version and the patches `update` would apply.
    pub fn status(&self) -> Result<Vec<NamespaceState>> {
        self.registry
            .namespaces()
            .iter()
            .map(|namespace| {
                let version = self.current_version(&namespace.name)?;
                let pending = namespace
                    .patches
                    .iter()
                    .filter(|patch| self.is_pending(patch, version.as_deref()))
                    .map(|patch| patch.version.clone())
                    .collect();
                Ok(NamespaceState { namespace: namespace.name.clone(), version, pending })
            })
            .collect()
    }

    /// Version used for patch selection. A store too old to hold version
    /// rows reads as untracked.
    fn current_version(&self, namespace: &str) -> Result<Option<String>> {
        match VersionStore::read(self.executor, namespace, &self.scope) {
            Ok(version) => Ok(version),
            Err(err) if self.classifier.is_untracked(&err) => {
                tracing::debug!(namespace, error = %err, "Version row not readable yet, treating as untracked");
                Ok(None)
            },
            Err(source) => {
                tracing::error!(namespace, error = %source, "Reading namespace version failed");
                Err(StorageError::VersionRead {
                    namespace: namespace.to_owned(),
                    scope: self.scope.clone(),
                    source,
                })
            },
        }
    }

    fn is_pending(&self, patch: &Patch, current: Option<&str>) -> bool {
        is_newer(&patch.version, current)
            && compare_versions(&patch.version, &self.target) != Ordering::Greater
    }

    fn update_namespace(&self, namespace: &Namespace) -> Result<NamespaceReport> {
        let name = namespace.name.as_str();
        let from = self.current_version(name)?;

        if namespace.patches.is_empty() {
            return Ok(NamespaceReport::unchanged(name, from, NamespaceStatus::NoPatches));
        }
        if from.as_deref().is_some_and(|v| compare_versions(v, &self.target) != Ordering::Less) {
            tracing::debug!(namespace = name, version = ?from, "Namespace up to date");
            return Ok(NamespaceReport::unchanged(name, from, NamespaceStatus::UpToDate));
        }

        let mut report = NamespaceReport::unchanged(name, from, NamespaceStatus::UpToDate);
        let mut current = report.from.clone();

        for patch in &namespace.patches {
            if !is_newer(&patch.version, current.as_deref()) {
                continue;
            }
            if !self.is_pending(patch, current.as_deref()) {
                tracing::debug!(namespace = name, version = %patch.version, target_version = %self.target, "Patch beyond target, not applied");
                continue;
            }

            self.apply_patch(name, patch, &mut report)?;

            VersionStore::write(self.executor, name, &self.scope, &patch.version).map_err(
                |source| StorageError::VersionWrite {
                    namespace: name.to_owned(),
                    version: patch.version.clone(),
                    source,
                },
            )?;
            tracing::info!(
                namespace = name,
                from = ?current,
                version = %patch.version,
                "Patch applied, version recorded"
            );

            current = Some(patch.version.clone());
            report.applied.push(patch.version.clone());
        }

        if !report.applied.is_empty() {
            report.status = NamespaceStatus::Patched;
        }
        report.to = current;
        Ok(report)
    }

    fn apply_patch(&self, namespace: &str, patch: &Patch, report: &mut NamespaceReport) -> Result<()> {
        for statement in &patch.statements {
            let result = self.executor.execute(statement, Params::None);
            match ExecutionOutcome::resolve(result, statement, &self.classifier) {
                ExecutionOutcome::Success => {},
                ExecutionOutcome::AlreadyApplied(reason) => {
                    tracing::warn!(
                        namespace,
                        version = %patch.version,
                        statement = %statement,
                        reason = %reason,
                        "Statement already applied, skipping"
                    );
                    report.skipped_statements.push(SkippedStatement {
                        version: patch.version.clone(),
                        statement: statement.clone(),
                        reason,
                    });
                },
                ExecutionOutcome::Fatal(source) => {
                    tracing::error!(
                        namespace,
                        version = %patch.version,
                        statement = %statement,
                        error = %source,
                        "Patch statement failed"
                    );
                    return Err(StorageError::Migration {
                        namespace: namespace.to_owned(),
                        version: patch.version.clone(),
                        statement: statement.clone(),
                        source,
                    });
                },
            }
        }
        Ok(())
    }
}
