//! Schema registry: the ordered, immutable list of namespaces the runner
//! creates and patches.
//!
//! Registry order is application order. The runner never sorts patches;
//! a registry whose patch versions go backwards is rejected when built.

use std::cmp::Ordering;
use std::collections::HashSet;

use dmsgui_core::compare_versions;
use thiserror::Error;

/// Programming errors in a registry definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("namespace name must not be empty")]
    EmptyName,

    #[error("namespace {0} is defined twice")]
    DuplicateNamespace(String),

    #[error("namespace {namespace} has a patch without a version")]
    EmptyVersion { namespace: String },

    #[error("patch {version} of {namespace} has no statements")]
    EmptyPatch { namespace: String, version: String },

    #[error("patches of {namespace} are out of order: {next} follows {previous}")]
    OutOfOrder { namespace: String, previous: String, next: String },
}

/// Ordered statements that bring a namespace to `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub version: String,
    pub statements: Vec<String>,
}

impl Patch {
    pub fn new<I, S>(version: impl Into<String>, statements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.into(),
            statements: statements.into_iter().map(Into::into).collect(),
        }
    }
}

/// One logical table with its create script and patch history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    /// DDL plus required seed rows, run as one transaction.
    pub create: String,
    pub patches: Vec<Patch>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, create: impl Into<String>) -> Self {
        Self { name: name.into(), create: create.into(), patches: Vec::new() }
    }

    #[must_use]
    pub fn patch(mut self, patch: Patch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Newest version any patch brings this namespace to.
    pub fn latest_version(&self) -> Option<&str> {
        self.patches.last().map(|p| p.version.as_str())
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let mut previous: Option<&str> = None;
        for patch in &self.patches {
            if patch.version.trim().is_empty() {
                return Err(RegistryError::EmptyVersion { namespace: self.name.clone() });
            }
            if patch.statements.is_empty() {
                return Err(RegistryError::EmptyPatch {
                    namespace: self.name.clone(),
                    version: patch.version.clone(),
                });
            }
            if let Some(prev) = previous
                && compare_versions(prev, &patch.version) == Ordering::Greater
            {
                return Err(RegistryError::OutOfOrder {
                    namespace: self.name.clone(),
                    previous: prev.to_owned(),
                    next: patch.version.clone(),
                });
            }
            previous = Some(&patch.version);
        }
        Ok(())
    }
}

/// Validated namespace definitions, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaRegistry {
    namespaces: Vec<Namespace>,
}

impl SchemaRegistry {
    pub fn new(namespaces: Vec<Namespace>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for namespace in &namespaces {
            namespace.validate()?;
            if !seen.insert(namespace.name.as_str()) {
                return Err(RegistryError::DuplicateNamespace(namespace.name.clone()));
            }
        }
        Ok(Self { namespaces })
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name == name)
    }

    /// Newest patch version across all namespaces.
    pub fn latest_version(&self) -> Option<&str> {
        self.namespaces
            .iter()
            .filter_map(Namespace::latest_version)
            .max_by(|a, b| compare_versions(a, b))
    }
}
