//! Read-only view of recorded versions and pending patches.

use dmsgui_core::Settings;
use dmsgui_storage::Storage;

pub(crate) fn run(settings: &Settings) -> anyhow::Result<()> {
    let storage = Storage::open(settings)?;
    let status = storage.status()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "database": settings.database,
            "target": storage.target_version(),
            "namespaces": status,
        }))?
    );
    Ok(())
}
