//! `dk list` — list tickets, optionally filtered by status.

use crate::output::{self, CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use clap::Args;
use desk_core::EngineError;
use desk_core::db::query;
use desk_core::engine;
use desk_core::model::Status;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (repeatable): open, in_progress, resolved, closed.
    #[arg(short, long, value_name = "STATUS")]
    pub status: Vec<String>,
}

/// Execute `dk list`.
///
/// # Errors
///
/// Returns an error when a status filter does not parse or the scan
/// fails.
pub fn run_list(args: &ListArgs, output: OutputMode, store_path: &Path) -> Result<()> {
    let conn = store::open_existing(store_path)?;

    let mut statuses = Vec::with_capacity(args.status.len());
    for raw in &args.status {
        match Status::from_str(raw) {
            Ok(status) => statuses.push(status),
            Err(err) => {
                render_error(output, &CliError::new(err.to_string()))?;
                anyhow::bail!("{err}");
            }
        }
    }

    let result = if statuses.is_empty() {
        engine::list_tickets(&conn)
    } else {
        query::list_tickets_with_status(&conn, &statuses).map_err(EngineError::from)
    };

    match result {
        Ok(tickets) => {
            render(output, &tickets, |tickets, w| {
                if tickets.is_empty() {
                    writeln!(w, "No tickets found")?;
                    return Ok(());
                }
                for ticket in tickets {
                    writeln!(
                        w,
                        "{}  {:<11}  v{:<3}  {}  {}",
                        ticket.ticket_id,
                        ticket.status.as_str(),
                        ticket.version,
                        output::fmt_timestamp_us(ticket.created_at_us),
                        ticket.title
                    )?;
                }
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
