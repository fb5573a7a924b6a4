use dmsgui_core::Settings;
use dmsgui_storage::Storage;

pub(crate) fn run(settings: &Settings, namespace: &str, scope: &str) -> anyhow::Result<()> {
    let storage = Storage::open(settings)?;
    match storage.get_version(namespace, scope)? {
        Some(version) => println!("{version}"),
        None => println!("undefined"),
    }
    Ok(())
}
