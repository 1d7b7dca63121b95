//! `dk comment` — append a comment to a ticket's trail.

use crate::actor;
use crate::output::{self, CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use desk_core::engine;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Ticket id to comment on.
    pub id: String,

    /// Comment body.
    pub text: String,
}

/// Execute `dk comment`. Any role may comment in any status.
///
/// # Errors
///
/// Returns an error when the actor does not resolve or the engine
/// rejects the comment.
pub fn run_comment(
    args: &CommentArgs,
    output: OutputMode,
    store_path: &Path,
    actor_flag: Option<&str>,
) -> Result<()> {
    let mut conn = store::open_existing(store_path)?;
    let config = store::load_config(store_path)?;

    let acting = match actor::resolve(&conn, actor_flag, &config) {
        Ok(user) => user,
        Err(err) => {
            render_error(output, &CliError::new(err.to_string()))?;
            return Err(err);
        }
    };

    match engine::add_comment(
        &mut conn,
        &args.id,
        &args.text,
        &acting,
        Utc::now().timestamp_micros(),
    ) {
        Ok(entry) => {
            render(output, &entry, |entry, w| {
                writeln!(
                    w,
                    "Comment added to {} at {}",
                    entry.ticket_id,
                    output::fmt_timestamp_us(entry.created_at_us)
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
