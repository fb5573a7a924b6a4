use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dmsgui_core::Settings;
use dmsgui_core::constants::DEFAULT_SCOPE;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "dmsgui-db")]
#[command(about = "Migrate and inspect the dms-gui SQLite store", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "DATABASE")]
    database: Option<PathBuf>,

    /// Schema version to migrate to
    #[arg(long, global = true, env = "DMSGUI_VERSION")]
    target: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and apply pending patches
    Migrate,
    /// Show recorded versions and pending patches without changing anything
    Status,
    /// Print the recorded version of one namespace
    Version {
        namespace: String,
        #[arg(long, default_value = DEFAULT_SCOPE)]
        scope: String,
    },
}

/// Load `<config>/.dms-gui.env` into the process environment, if present.
/// Variables already set win.
fn load_env_file() -> Option<PathBuf> {
    let config_path = std::env::var_os("DMSGUI_CONFIG_PATH").map(PathBuf::from);
    let env_file = Settings::env_file_in(config_path.as_deref());
    dotenvy::from_path(&env_file).ok().map(|()| env_file)
}

fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(database) = &cli.database {
        settings.database.clone_from(database);
    }
    if let Some(target) = &cli.target {
        settings.override_target(target, std::env::var_os("DMSGUI_SEED_VERSION").is_some())?;
    }
    Ok(settings)
}

fn main() -> Result<()> {
    let env_file = load_env_file();
    let cli = Cli::parse();
    let settings = resolve_settings(&cli)?;

    let default_level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Commands::Migrate => commands::migrate::run(&settings),
        Commands::Status => commands::status::run(&settings),
        Commands::Version { namespace, scope } => commands::version::run(&settings, &namespace, &scope),
    }
}
