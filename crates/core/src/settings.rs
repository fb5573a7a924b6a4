//! Store settings resolved from the dms-gui container environment.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::constants::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_CONFIG_PATH, DEFAULT_CONTAINER_NAME, DEFAULT_DATABASE,
    DEFAULT_DKIM_SELECTOR, DEFAULT_DMS_CONFIG_PATH, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_POOL_SIZE,
    DEFAULT_SCOPE, DEFAULT_SETUP_SCRIPT, DEMO_DATABASE, ENV_FILE_NAME, LOCK_FILE_SUFFIX,
    SCHEMA_VERSION,
};
use crate::env_config::{parse_flag, parse_with_default};
use crate::error::ConfigError;
use crate::version::normalize_version;

/// Everything the store needs to open, migrate and seed the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Running release; the migration target.
    pub app_version: String,
    /// Version written into seed rows of freshly created namespaces.
    pub seed_version: String,
    pub database: PathBuf,
    pub config_path: PathBuf,
    pub default_scope: String,
    pub container_name: String,
    pub setup_script: String,
    pub dms_config_path: String,
    pub dkim_selector: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    pub lock_timeout_ms: u64,
    pub debug: bool,
    pub demo: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_version: SCHEMA_VERSION.to_owned(),
            seed_version: SCHEMA_VERSION.to_owned(),
            database: PathBuf::from(DEFAULT_DATABASE),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            default_scope: DEFAULT_SCOPE.to_owned(),
            container_name: DEFAULT_CONTAINER_NAME.to_owned(),
            setup_script: DEFAULT_SETUP_SCRIPT.to_owned(),
            dms_config_path: DEFAULT_DMS_CONFIG_PATH.to_owned(),
            dkim_selector: DEFAULT_DKIM_SELECTOR.to_owned(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            debug: false,
            demo: false,
        }
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_version(var: &'static str, raw: &str) -> Result<String, ConfigError> {
    let version = normalize_version(raw);
    if version.is_empty() {
        return Err(ConfigError::InvalidValue {
            var,
            value: raw.to_owned(),
            reason: "version must not be empty",
        });
    }
    Ok(version.to_owned())
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let app_version = match lookup("DMSGUI_VERSION") {
            Some(raw) => parse_version("DMSGUI_VERSION", &raw)?,
            None => defaults.app_version,
        };
        let seed_version = match lookup("DMSGUI_SEED_VERSION") {
            Some(raw) => parse_version("DMSGUI_SEED_VERSION", &raw)?,
            None => app_version.clone(),
        };

        let demo = parse_flag(lookup("isDEMO").as_deref());
        let database = if demo {
            PathBuf::from(DEMO_DATABASE)
        } else {
            non_empty(lookup("DATABASE")).map_or(defaults.database, PathBuf::from)
        };

        Ok(Self {
            app_version,
            seed_version,
            database,
            config_path: non_empty(lookup("DMSGUI_CONFIG_PATH"))
                .map_or(defaults.config_path, PathBuf::from),
            default_scope: defaults.default_scope,
            container_name: non_empty(lookup("DMS_CONTAINER")).unwrap_or(defaults.container_name),
            setup_script: non_empty(lookup("DMS_SETUP_SCRIPT")).unwrap_or(defaults.setup_script),
            dms_config_path: non_empty(lookup("DMS_CONFIG_PATH"))
                .unwrap_or(defaults.dms_config_path),
            dkim_selector: non_empty(lookup("DKIM_SELECTOR_DEFAULT"))
                .unwrap_or(defaults.dkim_selector),
            pool_size: parse_with_default(
                "DMSGUI_DB_POOL_SIZE",
                lookup("DMSGUI_DB_POOL_SIZE").as_deref(),
                defaults.pool_size,
            )
            .max(1),
            busy_timeout_ms: parse_with_default(
                "DMSGUI_DB_BUSY_TIMEOUT_MS",
                lookup("DMSGUI_DB_BUSY_TIMEOUT_MS").as_deref(),
                defaults.busy_timeout_ms,
            ),
            lock_timeout_ms: parse_with_default(
                "DMSGUI_MIGRATION_LOCK_TIMEOUT_MS",
                lookup("DMSGUI_MIGRATION_LOCK_TIMEOUT_MS").as_deref(),
                defaults.lock_timeout_ms,
            ),
            debug: parse_flag(lookup("DEBUG").as_deref()),
            demo,
        })
    }

    /// Defaults pointed at a specific database file.
    pub fn for_database(database: impl Into<PathBuf>) -> Self {
        Self { database: database.into(), ..Self::default() }
    }

    /// Side file holding the cross-process migration lock.
    pub fn lock_path(&self) -> PathBuf {
        let mut path = self.database.clone().into_os_string();
        path.push(LOCK_FILE_SUFFIX);
        PathBuf::from(path)
    }

    /// Replace the migration target with an explicit override.
    ///
    /// The seed follows the new target unless `keep_seed` is set.
    pub fn override_target(&mut self, raw: &str, keep_seed: bool) -> Result<(), ConfigError> {
        self.app_version = parse_version("DMSGUI_VERSION", raw)?;
        if !keep_seed {
            self.seed_version.clone_from(&self.app_version);
        }
        Ok(())
    }

    /// Location of the optional dotenv file under `config_path`, or under
    /// the default config directory.
    pub fn env_file_in(config_path: Option<&Path>) -> PathBuf {
        config_path
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH))
            .join(ENV_FILE_NAME)
    }
}
