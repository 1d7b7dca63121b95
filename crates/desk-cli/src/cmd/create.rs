//! `dk create` — open a new ticket.

use crate::actor;
use crate::output::{self, CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use desk_core::engine;
use desk_core::model::{NewFieldValue, NewTicket};
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Title of the new ticket.
    #[arg(short, long)]
    pub title: String,

    /// Description text.
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Category id the ticket files under.
    #[arg(short, long, value_name = "CATEGORY_ID")]
    pub category: String,

    /// Custom field value as `<field-id>=<value>` (repeatable).
    #[arg(short, long, value_name = "FIELD_ID=VALUE")]
    pub field: Vec<String>,
}

fn parse_field(raw: &str) -> Result<NewFieldValue, String> {
    raw.split_once('=').map_or_else(
        || Err(format!("invalid field '{raw}': expected <field-id>=<value>")),
        |(field_id, value)| {
            Ok(NewFieldValue {
                field_id: field_id.trim().to_string(),
                value: value.to_string(),
            })
        },
    )
}

/// Execute `dk create`. The acting user becomes the requester.
///
/// # Errors
///
/// Returns an error when the actor cannot be resolved, a `--field`
/// pair is malformed, or the engine rejects the creation.
pub fn run_create(
    args: &CreateArgs,
    output: OutputMode,
    store_path: &Path,
    actor_flag: Option<&str>,
) -> Result<()> {
    let mut conn = store::open_existing(store_path)?;
    let config = store::load_config(store_path)?;

    let requester = match actor::resolve(&conn, actor_flag, &config) {
        Ok(user) => user,
        Err(err) => {
            render_error(output, &CliError::new(err.to_string()))?;
            return Err(err);
        }
    };

    let mut custom_field_values = Vec::with_capacity(args.field.len());
    for raw in &args.field {
        match parse_field(raw) {
            Ok(value) => custom_field_values.push(value),
            Err(reason) => {
                render_error(output, &CliError::new(reason.clone()))?;
                anyhow::bail!(reason);
            }
        }
    }

    let new = NewTicket {
        title: args.title.clone(),
        description: args.description.clone(),
        category_id: args.category.clone(),
        requester_id: requester.user_id,
        custom_field_values,
    };

    match engine::create(&mut conn, &new, Utc::now().timestamp_micros()) {
        Ok(ticket) => {
            render(output, &ticket, |ticket, w| {
                writeln!(
                    w,
                    "Created {} [{}] v{}",
                    ticket.ticket_id,
                    ticket.status.as_str(),
                    ticket.version
                )?;
                writeln!(w, "  category:        {}", ticket.category_name_snapshot)?;
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
