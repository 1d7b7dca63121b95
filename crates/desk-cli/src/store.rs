//! Store location and config plumbing shared by every subcommand.

use anyhow::{Context, Result, bail};
use desk_core::config::ProjectConfig;
use desk_core::db;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Open a store that `dk init` already created.
///
/// # Errors
///
/// Returns an error if there is no store at `store` or opening it fails.
pub fn open_existing(store: &Path) -> Result<Connection> {
    if !store.exists() {
        bail!("no store at {} (run `dk init` first)", store.display());
    }
    db::open_store(store)
}

/// The config file lives next to the store file.
pub fn config_path(store: &Path) -> PathBuf {
    store.parent().map_or_else(
        || PathBuf::from("config.toml"),
        |dir| dir.join("config.toml"),
    )
}

/// Load the project config next to `store`; defaults when absent.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config(store: &Path) -> Result<ProjectConfig> {
    ProjectConfig::load(&config_path(store)).context("load project config")
}
