//! dms-gui tables, in the order they are created and patched.
//!
//! `settings` comes first: every other create script seeds its version
//! row into it. Patches carry only schema and data changes; the runner
//! records versions itself.

mod accounts;
mod aliases;
mod domains;
mod logins;
mod roles;
mod settings;

use dmsgui_core::Settings;
use dmsgui_core::constants::{DEFAULT_DKIM_KEYSIZE, DEFAULT_DKIM_KEYTYPE};

use crate::registry::{RegistryError, SchemaRegistry};

/// Values interpolated into create scripts and patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContext {
    /// Version written into the seed row of a freshly created namespace.
    pub seed_version: String,
    /// Scope the dms-gui namespace versions are recorded under.
    pub scope: String,
    pub container_name: String,
    pub setup_script: String,
    pub dms_config_path: String,
    pub dkim_selector: String,
    pub dkim_keytype: String,
    pub dkim_keysize: String,
}

impl From<&Settings> for SchemaContext {
    fn from(settings: &Settings) -> Self {
        Self {
            seed_version: settings.seed_version.clone(),
            scope: settings.default_scope.clone(),
            container_name: settings.container_name.clone(),
            setup_script: settings.setup_script.clone(),
            dms_config_path: settings.dms_config_path.clone(),
            dkim_selector: settings.dkim_selector.clone(),
            dkim_keytype: DEFAULT_DKIM_KEYTYPE.to_owned(),
            dkim_keysize: DEFAULT_DKIM_KEYSIZE.to_owned(),
        }
    }
}

impl Default for SchemaContext {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Quote `value` as an SQL string literal.
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Production registry for the dms-gui store.
pub fn registry(ctx: &SchemaContext) -> Result<SchemaRegistry, RegistryError> {
    SchemaRegistry::new(vec![
        settings::namespace(ctx),
        logins::namespace(ctx),
        roles::namespace(ctx),
        accounts::namespace(ctx),
        aliases::namespace(ctx),
        domains::namespace(ctx),
    ])
}
