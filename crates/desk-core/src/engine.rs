//! Ticket lifecycle engine.
//!
//! Owns ticket creation, status transitions, and comment appending, and
//! orchestrates permission checks, optimistic-concurrency enforcement,
//! SLA stamping, and audit recording as one unit of work per operation.
//!
//! Every mutating operation runs inside a single `BEGIN IMMEDIATE`
//! transaction: the ticket write and its history entry either both
//! commit or both roll back, and a partially-created ticket (row without
//! its `created` entry) is never observable.

use rusqlite::{Connection, TransactionBehavior, params};
use tracing::info;

use crate::{
    EngineError, Result, audit,
    db::query,
    id,
    model::{ActionKind, HistoryEntry, NewTicket, Status, Ticket, TicketDetail, User},
    permission, sla,
};

/// Minimum length of a comment, in characters.
pub const MIN_COMMENT_CHARS: usize = 5;

/// Create a ticket in status `open` with `version = 1`.
///
/// Resolves the category, snapshots its name, computes both SLA targets
/// from `now_us`, persists the ticket plus its custom field values, and
/// records a `created` history entry authored by the requester — all in
/// one transaction.
///
/// # Errors
///
/// - [`EngineError::Validation`] when the title is blank
/// - [`EngineError::NotFound`] when the category or requester is missing
/// - [`EngineError::Store`] on SQLite failure
pub fn create(conn: &mut Connection, new: &NewTicket, now_us: i64) -> Result<Ticket> {
    if new.title.trim().is_empty() {
        return Err(EngineError::validation("title must not be blank"));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let category =
        query::get_category(&tx, &new.category_id)?.ok_or_else(|| EngineError::NotFound {
            what: "category",
            id: new.category_id.clone(),
        })?;
    let requester =
        query::get_user(&tx, &new.requester_id)?.ok_or_else(|| EngineError::NotFound {
            what: "user",
            id: new.requester_id.clone(),
        })?;

    let ticket = Ticket {
        ticket_id: id::ticket_id(),
        title: new.title.clone(),
        description: new.description.clone(),
        status: Status::Open,
        version: 1,
        created_at_us: now_us,
        sla_first_response_target_us: sla::target_timestamp(
            now_us,
            category.sla_first_response_hours,
        ),
        sla_resolution_target_us: sla::target_timestamp(now_us, category.sla_resolution_hours),
        category_name_snapshot: category.name.clone(),
        requester_id: requester.user_id.clone(),
        category_id: category.category_id.clone(),
    };

    tx.execute(
        "INSERT INTO tickets (
            ticket_id, title, description, status, version, created_at_us,
            sla_first_response_target_us, sla_resolution_target_us,
            category_name_snapshot, requester_id, category_id
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            ticket.ticket_id,
            ticket.title,
            ticket.description,
            ticket.status.as_str(),
            ticket.version,
            ticket.created_at_us,
            ticket.sla_first_response_target_us,
            ticket.sla_resolution_target_us,
            ticket.category_name_snapshot,
            ticket.requester_id,
            ticket.category_id
        ],
    )?;

    for value in &new.custom_field_values {
        tx.execute(
            "INSERT INTO ticket_custom_field_values (ticket_id, field_id, value)
             VALUES (?1, ?2, ?3)",
            params![ticket.ticket_id, value.field_id, value.value],
        )?;
    }

    audit::record(
        &tx,
        &ticket.ticket_id,
        &requester.user_id,
        ActionKind::Created,
        None,
        None,
        None,
        now_us,
    )?;

    tx.commit()?;

    info!(
        ticket_id = %ticket.ticket_id,
        category = %ticket.category_name_snapshot,
        requester = %ticket.requester_id,
        "ticket created"
    );

    Ok(ticket)
}

/// Move a ticket to `new_status` on behalf of `acting`.
///
/// Permission is checked first, then the submitted `expected_version` is
/// compared against the stored row. The row update itself is guarded
/// with `WHERE version = expected`, so the compare-and-swap leaves no
/// gap between check and write. On success the version increments by
/// exactly 1 and a `status_change` entry lands in the same transaction.
///
/// # Errors
///
/// - [`EngineError::NotFound`] when the ticket is missing
/// - [`EngineError::Forbidden`] when the matrix has no rule for the move
/// - [`EngineError::Conflict`] when `expected_version` is stale
/// - [`EngineError::Store`] on SQLite failure
pub fn change_status(
    conn: &mut Connection,
    ticket_id: &str,
    new_status: Status,
    expected_version: i64,
    acting: &User,
    now_us: i64,
) -> Result<Ticket> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let ticket = query::get_ticket(&tx, ticket_id)?.ok_or_else(|| EngineError::NotFound {
        what: "ticket",
        id: ticket_id.to_string(),
    })?;

    if !permission::is_allowed(acting.role, ticket.status, new_status) {
        return Err(EngineError::Forbidden {
            role: acting.role,
            from: ticket.status,
            to: new_status,
        });
    }

    if expected_version != ticket.version {
        return Err(EngineError::Conflict {
            id: ticket_id.to_string(),
            expected: expected_version,
            stored: ticket.version,
        });
    }

    let updated = tx.execute(
        "UPDATE tickets
         SET status = ?1, version = version + 1
         WHERE ticket_id = ?2 AND version = ?3",
        params![new_status.as_str(), ticket_id, expected_version],
    )?;
    if updated == 0 {
        let stored = query::get_ticket(&tx, ticket_id)?.map_or(expected_version, |t| t.version);
        return Err(EngineError::Conflict {
            id: ticket_id.to_string(),
            expected: expected_version,
            stored,
        });
    }

    audit::record(
        &tx,
        ticket_id,
        &acting.user_id,
        ActionKind::StatusChange,
        Some(ticket.status),
        Some(new_status),
        None,
        now_us,
    )?;

    tx.commit()?;

    info!(
        ticket_id = %ticket_id,
        from = %ticket.status,
        to = %new_status,
        version = ticket.version + 1,
        acting = %acting.user_id,
        "ticket status changed"
    );

    Ok(Ticket {
        status: new_status,
        version: ticket.version + 1,
        ..ticket
    })
}

/// Append a comment to a ticket's trail.
///
/// Any role may comment on any ticket in any status. Comments do not
/// touch the ticket's status-bearing fields, so there is no permission
/// check and no version check, and `version` stays put.
///
/// # Errors
///
/// - [`EngineError::Validation`] when the trimmed text is shorter than
///   [`MIN_COMMENT_CHARS`]
/// - [`EngineError::NotFound`] when the ticket is missing
/// - [`EngineError::Store`] on SQLite failure
pub fn add_comment(
    conn: &mut Connection,
    ticket_id: &str,
    text: &str,
    acting: &User,
    now_us: i64,
) -> Result<HistoryEntry> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_COMMENT_CHARS {
        return Err(EngineError::validation(format!(
            "comment must be at least {MIN_COMMENT_CHARS} characters"
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if query::get_ticket(&tx, ticket_id)?.is_none() {
        return Err(EngineError::NotFound {
            what: "ticket",
            id: ticket_id.to_string(),
        });
    }

    let entry = audit::record(
        &tx,
        ticket_id,
        &acting.user_id,
        ActionKind::CommentAdded,
        None,
        None,
        Some(trimmed),
        now_us,
    )?;

    tx.commit()?;

    info!(ticket_id = %ticket_id, acting = %acting.user_id, "comment added");

    Ok(entry)
}

/// Fetch a ticket with its ordered audit trail and field values.
///
/// # Errors
///
/// - [`EngineError::NotFound`] when the ticket is missing
/// - [`EngineError::Store`] on SQLite failure
pub fn get_ticket(conn: &Connection, ticket_id: &str) -> Result<TicketDetail> {
    let ticket = query::get_ticket(conn, ticket_id)?.ok_or_else(|| EngineError::NotFound {
        what: "ticket",
        id: ticket_id.to_string(),
    })?;
    let custom_field_values = query::custom_field_values(conn, ticket_id)?;
    let history = query::ticket_history(conn, ticket_id)?;
    Ok(TicketDetail {
        ticket,
        custom_field_values,
        history,
    })
}

/// All tickets, newest first.
///
/// # Errors
///
/// Returns [`EngineError::Store`] on SQLite failure.
pub fn list_tickets(conn: &Connection) -> Result<Vec<Ticket>> {
    Ok(query::list_tickets(conn)?)
}

/// Administrative bulk delete.
///
/// This is an out-of-band override, not a lifecycle transition: it
/// bypasses the permission matrix and version counter, writes no
/// terminating history entry, and removes child rows via cascade.
/// Returns how many tickets existed and went away.
///
/// # Errors
///
/// Returns [`EngineError::Store`] on SQLite failure.
pub fn remove_tickets(conn: &Connection, ticket_ids: &[String]) -> Result<usize> {
    let removed = query::delete_tickets(conn, ticket_ids)?;
    info!(requested = ticket_ids.len(), removed, "tickets removed (administrative)");
    Ok(removed)
}
