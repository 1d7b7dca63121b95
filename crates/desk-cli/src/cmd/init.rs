//! `dk init` — create the ticket store.

use crate::output::{OutputMode, render};
use anyhow::{Context, Result};
use clap::Args;
use desk_core::db;
use desk_core::model::{Category, User};
use desk_core::seed;
use serde::Serialize;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Recreate the store even if one already exists.
    #[arg(long)]
    pub force: bool,

    /// Seed demo users and categories into the fresh store.
    #[arg(long)]
    pub demo: bool,
}

const CONFIG_TOML: &str = "# desk project configuration\n\
    \n\
    [actor]\n\
    # User id assumed when --as is omitted.\n\
    # default = \"usr-12ab34cd\"\n\
    \n\
    [report]\n\
    # Trailing window for the recent-volume KPI, in days.\n\
    window_days = 7\n";

const GITIGNORE: &str = "desk.db\ndesk.db-wal\ndesk.db-shm\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    store: String,
    users: Vec<User>,
    categories: Vec<Category>,
}

fn sidecar_path(store: &Path, suffix: &str) -> PathBuf {
    let mut name = store
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    name.push(suffix);
    store.with_file_name(name)
}

/// Execute `dk init`. Creates the store skeleton:
///
/// ```text
/// .desk/
///   desk.db         (SQLite store, migrated to the latest schema)
///   config.toml     (commented default config)
///   .gitignore      (desk.db and its WAL siblings)
/// ```
///
/// # Errors
///
/// Returns an error if the store already exists and `--force` is not
/// set, or if any filesystem or store operation fails.
pub fn run_init(args: &InitArgs, output: OutputMode, store: &Path) -> Result<()> {
    if store.exists() {
        if !args.force {
            anyhow::bail!(
                "store already exists at {} (use `dk init --force` to recreate)",
                store.display()
            );
        }
        std::fs::remove_file(store).with_context(|| format!("remove {}", store.display()))?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = sidecar_path(store, suffix);
            if sidecar.exists() {
                std::fs::remove_file(&sidecar)
                    .with_context(|| format!("remove {}", sidecar.display()))?;
            }
        }
    }

    let mut conn = db::open_store(store)?;

    let (users, categories) = if args.demo {
        let summary = seed::demo_data(&mut conn)?;
        (summary.users, summary.categories)
    } else {
        (Vec::new(), Vec::new())
    };

    if let Some(dir) = store.parent() {
        let config = dir.join("config.toml");
        if !config.exists() {
            std::fs::write(&config, CONFIG_TOML)
                .with_context(|| format!("write {}", config.display()))?;
        }
        let gitignore = dir.join(".gitignore");
        if !gitignore.exists() {
            std::fs::write(&gitignore, GITIGNORE)
                .with_context(|| format!("write {}", gitignore.display()))?;
        }
    }

    let out = InitOutput {
        store: store.display().to_string(),
        users,
        categories,
    };
    render(output, &out, |out, w| {
        writeln!(w, "Initialized desk store at {}", out.store)?;
        if !out.users.is_empty() {
            writeln!(w)?;
            writeln!(w, "Seeded users:")?;
            for user in &out.users {
                writeln!(
                    w,
                    "  {}  {:<9}  {}",
                    user.user_id,
                    user.role.as_str(),
                    user.name
                )?;
            }
            writeln!(w)?;
            writeln!(w, "Seeded categories:")?;
            for category in &out.categories {
                writeln!(
                    w,
                    "  {}  {} (first response {}h, resolution {}h)",
                    category.category_id,
                    category.name,
                    category.sla_first_response_hours,
                    category.sla_resolution_hours
                )?;
            }
        }
        Ok(())
    })?;
    Ok(())
}
