//! Shared constants for the dms-gui store.
//!
//! Defaults mirror the paths and names the dms-gui container ships with.

/// Newest patch version shipped by the schema registry, and the default
/// migration target when `DMSGUI_VERSION` is not set.
pub const SCHEMA_VERSION: &str = "1.2.4";

/// Scope under which dms-gui records its own namespace versions.
pub const DEFAULT_SCOPE: &str = "dms-gui";

/// Prefix of the `settings.name` key holding a namespace version.
pub const VERSION_KEY_PREFIX: &str = "DB_VERSION_";

/// `settings.isMutable` value for user-editable rows.
pub const IS_MUTABLE: i64 = 1;

/// `settings.isMutable` value for rows owned by dms-gui itself.
pub const IS_IMMUTABLE: i64 = 0;

pub const DEFAULT_CONFIG_PATH: &str = "/app/config";
pub const DEFAULT_DATABASE: &str = "/app/config/dms-gui.sqlite3";
pub const DEMO_DATABASE: &str = "/app/config/dms-gui-demo.sqlite3";

/// File name of the dotenv file read from the config directory.
pub const ENV_FILE_NAME: &str = ".dms-gui.env";

pub const DEFAULT_CONTAINER_NAME: &str = "dms";
pub const DEFAULT_SETUP_SCRIPT: &str = "/usr/local/bin/setup";
pub const DEFAULT_DMS_CONFIG_PATH: &str = "/tmp/docker-mailserver";

/// DKIM selector hardcoded by docker-mailserver.
pub const DEFAULT_DKIM_SELECTOR: &str = "mail";
pub const DEFAULT_DKIM_KEYTYPE: &str = "rsa";
pub const DEFAULT_DKIM_KEYSIZE: &str = "2048";

/// r2d2 pool size for the store.
pub const DEFAULT_POOL_SIZE: u32 = 4;

/// SQLite busy timeout applied to every pooled connection.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// How long a second process waits for the migration lock.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 30_000;

/// Suffix appended to the database path for the migration lock file.
pub const LOCK_FILE_SUFFIX: &str = ".migrate-lock";
