//! Bring the store to the target schema version.
//!
//! Takes the migration lock, runs every create script, then applies
//! pending patches. Prints the combined report as JSON.

use dmsgui_core::Settings;
use dmsgui_storage::Storage;

pub(crate) fn run(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(
        database = %settings.database.display(),
        target_version = %settings.app_version,
        "Migrating store"
    );
    let storage = Storage::connect(settings)?;
    let report = storage.migrate()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
