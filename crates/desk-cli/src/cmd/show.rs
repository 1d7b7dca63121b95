//! `dk show` — full detail for one ticket, trail included.

use crate::output::{self, CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use clap::Args;
use desk_core::engine;
use desk_core::model::{ActionKind, HistoryEntry, Status};
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket id to display.
    pub id: String,
}

fn entry_summary(entry: &HistoryEntry) -> String {
    match entry.action {
        ActionKind::Created => format!("created by {}", entry.user_id),
        ActionKind::StatusChange => format!(
            "{} -> {} by {}",
            entry.old_status.map_or("?", Status::as_str),
            entry.new_status.map_or("?", Status::as_str),
            entry.user_id
        ),
        ActionKind::CommentAdded => format!(
            "comment by {}: {}",
            entry.user_id,
            entry.comment.as_deref().unwrap_or("")
        ),
    }
}

/// Execute `dk show`.
///
/// # Errors
///
/// Returns an error when the ticket does not exist or the read fails.
pub fn run_show(args: &ShowArgs, output: OutputMode, store_path: &Path) -> Result<()> {
    let conn = store::open_existing(store_path)?;

    match engine::get_ticket(&conn, &args.id) {
        Ok(detail) => {
            render(output, &detail, |detail, w| {
                let ticket = &detail.ticket;
                writeln!(
                    w,
                    "{}  [{}] v{}",
                    ticket.ticket_id,
                    ticket.status.as_str(),
                    ticket.version
                )?;
                writeln!(w, "  title:           {}", ticket.title)?;
                if !ticket.description.is_empty() {
                    writeln!(w, "  description:     {}", ticket.description)?;
                }
                writeln!(w, "  category:        {}", ticket.category_name_snapshot)?;
                writeln!(w, "  requester:       {}", ticket.requester_id)?;
                writeln!(
                    w,
                    "  created:         {}",
                    output::fmt_timestamp_us(ticket.created_at_us)
                )?;
                writeln!(
                    w,
                    "  first response:  {}",
                    output::fmt_timestamp_us(ticket.sla_first_response_target_us)
                )?;
                writeln!(
                    w,
                    "  resolution due:  {}",
                    output::fmt_timestamp_us(ticket.sla_resolution_target_us)
                )?;
                if !detail.custom_field_values.is_empty() {
                    writeln!(w)?;
                    writeln!(w, "Fields:")?;
                    for value in &detail.custom_field_values {
                        writeln!(w, "  {}: {}", value.label, value.value)?;
                    }
                }
                writeln!(w)?;
                writeln!(w, "History:")?;
                for entry in &detail.history {
                    writeln!(
                        w,
                        "  {}  {}",
                        output::fmt_timestamp_us(entry.created_at_us),
                        entry_summary(entry)
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
