//! `dk delete` — administrative bulk delete.
//!
//! Bypasses the lifecycle: no permission check, no version check, and
//! no terminating history entry. The ticket and its children go away;
//! `--force` is required so nobody does this by accident.

use crate::output::{CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use clap::Args;
use desk_core::engine;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Ticket ids to delete.
    #[arg(required = true, value_name = "TICKET_ID")]
    pub ids: Vec<String>,

    /// Confirm the administrative delete.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    requested: usize,
    removed: usize,
}

/// Execute `dk delete`.
///
/// # Errors
///
/// Returns an error when `--force` is missing or the delete fails.
pub fn run_delete(args: &DeleteArgs, output: OutputMode, store_path: &Path) -> Result<()> {
    if !args.force {
        let reason = "refusing to delete: this bypasses the audit trail, pass --force to confirm";
        render_error(output, &CliError::new(reason))?;
        anyhow::bail!(reason);
    }

    let conn = store::open_existing(store_path)?;

    match engine::remove_tickets(&conn, &args.ids) {
        Ok(removed) => {
            let out = DeleteOutput {
                requested: args.ids.len(),
                removed,
            };
            render(output, &out, |out, w| {
                writeln!(w, "Removed {} of {} ticket(s)", out.removed, out.requested)?;
                Ok(())
            })?;
            Ok(())
        }
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}
