//! Test utilities and module declarations for storage tests.

use std::path::Path;

use dmsgui_core::Settings;
use tempfile::TempDir;

use crate::executor::{Params, StatementExecutor};
use crate::{Namespace, SchemaContext, SchemaRegistry, Storage, schema};

pub fn test_settings(dir: &Path) -> Settings {
    let mut settings = Settings::for_database(dir.join("test.db"));
    settings.lock_timeout_ms = 1000;
    settings.busy_timeout_ms = 1000;
    settings
}

/// Fresh, fully migrated store at the default target.
#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(&test_settings(temp_dir.path())).unwrap();
    (storage, temp_dir)
}

/// Unmigrated store whose create scripts seed `seed` and whose target is `target`.
#[expect(clippy::unwrap_used, reason = "test code")]
pub fn create_unmigrated_storage(seed: &str, target: &str) -> (Storage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = test_settings(temp_dir.path());
    seed.clone_into(&mut settings.seed_version);
    target.clone_into(&mut settings.app_version);
    let storage = Storage::connect(&settings).unwrap();
    (storage, temp_dir)
}

/// Production `settings` namespace followed by `extra`.
#[expect(clippy::unwrap_used, reason = "test code")]
pub fn registry_with(seed: &str, extra: Vec<Namespace>) -> SchemaRegistry {
    let ctx = SchemaContext { seed_version: seed.to_owned(), ..SchemaContext::default() };
    let settings = schema::registry(&ctx).unwrap().namespace("settings").cloned().unwrap();
    let mut namespaces = vec![settings];
    namespaces.extend(extra);
    SchemaRegistry::new(namespaces).unwrap()
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn scalar<E: StatementExecutor + ?Sized>(executor: &E, sql: &str) -> Option<String> {
    executor.query_value(sql, Params::None).unwrap()
}

#[expect(clippy::unwrap_used, reason = "test code")]
pub fn has_column<E: StatementExecutor + ?Sized>(executor: &E, table: &str, column: &str) -> bool {
    let count = scalar(
        executor,
        &format!("SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = '{column}'"),
    );
    count.unwrap().parse::<i64>().unwrap() > 0
}
