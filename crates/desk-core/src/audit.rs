//! Append-only audit trail recorder.
//!
//! [`record`] is the only write path to `ticket_history` in the whole
//! workspace; no update or delete operation on history exists anywhere.
//! Callers invoke it inside the transaction of the lifecycle mutation it
//! records, so the ticket write and its audit entry share one commit or
//! rollback fate.

use crate::model::{ActionKind, HistoryEntry, Status};
use rusqlite::{Connection, params};

/// Append one immutable history entry for `ticket_id`.
///
/// `old_status`/`new_status` are set only for [`ActionKind::StatusChange`],
/// `comment` only for [`ActionKind::CommentAdded`]; [`ActionKind::Created`]
/// carries neither.
///
/// # Errors
///
/// Returns an error if the insert fails.
#[allow(clippy::too_many_arguments)]
pub fn record(
    conn: &Connection,
    ticket_id: &str,
    user_id: &str,
    action: ActionKind,
    old_status: Option<Status>,
    new_status: Option<Status>,
    comment: Option<&str>,
    at_us: i64,
) -> rusqlite::Result<HistoryEntry> {
    conn.execute(
        "INSERT INTO ticket_history
         (ticket_id, user_id, action, old_value, new_value, comment, created_at_us)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            ticket_id,
            user_id,
            action.as_str(),
            old_status.map(Status::as_str),
            new_status.map(Status::as_str),
            comment,
            at_us
        ],
    )?;

    Ok(HistoryEntry {
        history_id: conn.last_insert_rowid(),
        ticket_id: ticket_id.to_string(),
        user_id: user_id.to_string(),
        action,
        old_status,
        new_status,
        comment: comment.map(str::to_string),
        created_at_us: at_us,
    })
}
