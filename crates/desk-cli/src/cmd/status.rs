//! `dk status` — move a ticket to a new lifecycle status.

use crate::actor;
use crate::output::{CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use desk_core::engine;
use desk_core::model::Status;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Ticket id.
    pub id: String,

    /// Target status: in_progress, resolved, or closed.
    pub to: String,

    /// The ticket version this change was decided against.
    #[arg(long, value_name = "N")]
    pub version: i64,
}

/// Execute `dk status`.
///
/// # Errors
///
/// Returns an error when the target status or actor does not resolve,
/// or the engine rejects the transition.
pub fn run_status(
    args: &StatusArgs,
    output: OutputMode,
    store_path: &Path,
    actor_flag: Option<&str>,
) -> Result<()> {
    let mut conn = store::open_existing(store_path)?;
    let config = store::load_config(store_path)?;

    let new_status = match Status::from_str(&args.to) {
        Ok(status) => status,
        Err(err) => {
            render_error(output, &CliError::new(err.to_string()))?;
            anyhow::bail!("{err}");
        }
    };

    let acting = match actor::resolve(&conn, actor_flag, &config) {
        Ok(user) => user,
        Err(err) => {
            render_error(output, &CliError::new(err.to_string()))?;
            return Err(err);
        }
    };

    match engine::change_status(
        &mut conn,
        &args.id,
        new_status,
        args.version,
        &acting,
        Utc::now().timestamp_micros(),
    ) {
        Ok(ticket) => {
            render(output, &ticket, |ticket, w| {
                writeln!(
                    w,
                    "{} is now {} (v{})",
                    ticket.ticket_id,
                    ticket.status.as_str(),
                    ticket.version
                )?;
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
