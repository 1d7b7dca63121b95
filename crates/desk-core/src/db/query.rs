//! Typed query helpers for the desk store.
//!
//! All functions take a shared `&Connection` reference (a transaction
//! derefs to one) and return `rusqlite::Result<T>` with model structs,
//! never raw rows. Enum columns are parsed on the way out; a value the
//! schema should have rejected surfaces as a conversion failure rather
//! than a silently-wrong string.

use crate::model::{
    ActionKind, Category, CustomFieldValue, FieldDefinition, HistoryEntry, ParseEnumError, Status,
    Ticket, User,
};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter, types::Type};
use std::fmt::Write as _;
use std::str::FromStr;

const TICKET_COLUMNS: &str = "ticket_id, title, description, status, version, created_at_us, \
     sla_first_response_target_us, sla_resolution_target_us, category_name_snapshot, \
     requester_id, category_id";

const HISTORY_COLUMNS: &str =
    "history_id, ticket_id, user_id, action, old_value, new_value, comment, created_at_us";

fn parse_enum<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    T::from_str(raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
    })
}

fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let status: String = row.get(3)?;
    Ok(Ticket {
        ticket_id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: parse_enum(3, &status)?,
        version: row.get(4)?,
        created_at_us: row.get(5)?,
        sla_first_response_target_us: row.get(6)?,
        sla_resolution_target_us: row.get(7)?,
        category_name_snapshot: row.get(8)?,
        requester_id: row.get(9)?,
        category_id: row.get(10)?,
    })
}

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<HistoryEntry> {
    let action: String = row.get(3)?;
    let old_value: Option<String> = row.get(4)?;
    let new_value: Option<String> = row.get(5)?;
    Ok(HistoryEntry {
        history_id: row.get(0)?,
        ticket_id: row.get(1)?,
        user_id: row.get(2)?,
        action: parse_enum(3, &action)?,
        old_status: old_value.as_deref().map(|raw| parse_enum(4, raw)).transpose()?,
        new_status: new_value.as_deref().map(|raw| parse_enum(5, raw)).transpose()?,
        comment: row.get(6)?,
        created_at_us: row.get(7)?,
    })
}

/// Render `?1, ?2, ...` for a dynamic `IN` clause of `len` values.
fn placeholders(len: usize) -> String {
    let mut out = String::new();
    for idx in 1..=len {
        if idx > 1 {
            out.push_str(", ");
        }
        let _ = write!(out, "?{idx}");
    }
    out
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Fetch a single ticket by id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored enum value is corrupt.
pub fn get_ticket(conn: &Connection, ticket_id: &str) -> rusqlite::Result<Option<Ticket>> {
    conn.query_row(
        &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket_id = ?1"),
        params![ticket_id],
        ticket_from_row,
    )
    .optional()
}

/// All tickets, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tickets(conn: &Connection) -> rusqlite::Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets
         ORDER BY created_at_us DESC, ticket_id ASC"
    ))?;
    stmt.query_map([], ticket_from_row)?.collect()
}

/// Tickets whose status is in `statuses`, newest first.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_tickets_with_status(
    conn: &Connection,
    statuses: &[Status],
) -> rusqlite::Result<Vec<Ticket>> {
    if statuses.is_empty() {
        return Ok(Vec::new());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets
         WHERE status IN ({})
         ORDER BY created_at_us DESC, ticket_id ASC",
        placeholders(statuses.len())
    ))?;
    stmt.query_map(
        params_from_iter(statuses.iter().map(|status| status.as_str())),
        ticket_from_row,
    )?
    .collect()
}

/// Count of tickets whose status is in `statuses`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tickets_with_status(
    conn: &Connection,
    statuses: &[Status],
) -> rusqlite::Result<i64> {
    if statuses.is_empty() {
        return Ok(0);
    }
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM tickets WHERE status IN ({})",
            placeholders(statuses.len())
        ),
        params_from_iter(statuses.iter().map(|status| status.as_str())),
        |row| row.get(0),
    )
}

/// Count of tickets created strictly after `cutoff_us`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_tickets_created_after(conn: &Connection, cutoff_us: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM tickets WHERE created_at_us > ?1",
        params![cutoff_us],
        |row| row.get(0),
    )
}

/// Delete tickets by id, returning how many rows went away.
///
/// Child rows (history, custom field values) go with them via
/// `ON DELETE CASCADE`. This is the administrative bulk-delete path; the
/// lifecycle engine itself never deletes tickets.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_tickets(conn: &Connection, ticket_ids: &[String]) -> rusqlite::Result<usize> {
    if ticket_ids.is_empty() {
        return Ok(0);
    }
    conn.execute(
        &format!(
            "DELETE FROM tickets WHERE ticket_id IN ({})",
            placeholders(ticket_ids.len())
        ),
        params_from_iter(ticket_ids.iter()),
    )
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A ticket's full audit trail, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored enum value is corrupt.
pub fn ticket_history(conn: &Connection, ticket_id: &str) -> rusqlite::Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLUMNS} FROM ticket_history
         WHERE ticket_id = ?1
         ORDER BY created_at_us ASC, history_id ASC"
    ))?;
    stmt.query_map(params![ticket_id], history_from_row)?.collect()
}

/// A `(ticket, instant)` pair from the resolution-event scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionEvent {
    pub ticket_id: String,
    pub created_at_us: i64,
}

/// Every `status_change` entry that moved a ticket to `resolved`,
/// ordered by creation time ascending.
///
/// Ascending order matters: the compliance aggregate keeps the first
/// event it sees per ticket.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn resolution_events(conn: &Connection) -> rusqlite::Result<Vec<ResolutionEvent>> {
    let mut stmt = conn.prepare(
        "SELECT ticket_id, created_at_us FROM ticket_history
         WHERE action = ?1 AND new_value = ?2
         ORDER BY created_at_us ASC, history_id ASC",
    )?;
    stmt.query_map(
        params![ActionKind::StatusChange.as_str(), Status::Resolved.as_str()],
        |row| {
            Ok(ResolutionEvent {
                ticket_id: row.get(0)?,
                created_at_us: row.get(1)?,
            })
        },
    )?
    .collect()
}

// ---------------------------------------------------------------------------
// Custom field values
// ---------------------------------------------------------------------------

/// The custom field values captured at a ticket's creation, joined to
/// their field definitions for the label, in definition order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn custom_field_values(
    conn: &Connection,
    ticket_id: &str,
) -> rusqlite::Result<Vec<CustomFieldValue>> {
    let mut stmt = conn.prepare(
        "SELECT v.field_id, f.label, v.value
         FROM ticket_custom_field_values v
         JOIN custom_fields f ON f.field_id = v.field_id
         WHERE v.ticket_id = ?1
         ORDER BY f.position ASC, v.value_id ASC",
    )?;
    stmt.query_map(params![ticket_id], |row| {
        Ok(CustomFieldValue {
            field_id: row.get(0)?,
            label: row.get(1)?,
            value: row.get(2)?,
        })
    })?
    .collect()
}

// ---------------------------------------------------------------------------
// Reference data: categories and users
// ---------------------------------------------------------------------------

fn field_definitions(conn: &Connection, category_id: &str) -> rusqlite::Result<Vec<FieldDefinition>> {
    let mut stmt = conn.prepare(
        "SELECT field_id, label, field_type, is_required
         FROM custom_fields
         WHERE category_id = ?1
         ORDER BY position ASC, field_id ASC",
    )?;
    stmt.query_map(params![category_id], |row| {
        let field_type: String = row.get(2)?;
        Ok(FieldDefinition {
            field_id: row.get(0)?,
            label: row.get(1)?,
            field_type: parse_enum(2, &field_type)?,
            is_required: row.get(3)?,
        })
    })?
    .collect()
}

/// Fetch a category with its ordered field definitions.
///
/// # Errors
///
/// Returns an error if the query fails or a stored enum value is corrupt.
pub fn get_category(conn: &Connection, category_id: &str) -> rusqlite::Result<Option<Category>> {
    let head = conn
        .query_row(
            "SELECT category_id, name, sla_first_response_hours, sla_resolution_hours
             FROM categories WHERE category_id = ?1",
            params![category_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;

    match head {
        None => Ok(None),
        Some((category_id, name, first_response, resolution)) => {
            let fields = field_definitions(conn, &category_id)?;
            Ok(Some(Category {
                category_id,
                name,
                sla_first_response_hours: first_response,
                sla_resolution_hours: resolution,
                field_definitions: fields,
            }))
        }
    }
}

/// All categories with their field definitions, by name.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_categories(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let ids: Vec<String> = {
        let mut stmt =
            conn.prepare("SELECT category_id FROM categories ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<_>>()?
    };

    let mut categories = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(category) = get_category(conn, &id)? {
            categories.push(category);
        }
    }
    Ok(categories)
}

/// Fetch a user by id.
///
/// # Errors
///
/// Returns an error if the query fails or a stored role is corrupt.
pub fn get_user(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT user_id, name, email, role FROM users WHERE user_id = ?1",
        params![user_id],
        |row| {
            let role: String = row.get(3)?;
            Ok(User {
                user_id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                role: parse_enum(3, &role)?,
            })
        },
    )
    .optional()
}

/// Insert a user row. Seed/test surface; the engine only reads users.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_user(conn: &Connection, user: &User) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO users (user_id, name, email, role) VALUES (?1, ?2, ?3, ?4)",
        params![user.user_id, user.name, user.email, user.role.as_str()],
    )?;
    Ok(())
}

/// Insert a category and its field definitions. Seed/test surface; the
/// engine only reads categories. Call inside a transaction when the
/// category must land atomically with other writes.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub fn insert_category(conn: &Connection, category: &Category) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO categories (category_id, name, sla_first_response_hours, sla_resolution_hours)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            category.category_id,
            category.name,
            category.sla_first_response_hours,
            category.sla_resolution_hours
        ],
    )?;
    for (position, field) in category.field_definitions.iter().enumerate() {
        conn.execute(
            "INSERT INTO custom_fields (field_id, category_id, label, field_type, is_required, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                field.field_id,
                category.category_id,
                field.label,
                field.field_type.as_str(),
                field.is_required,
                position as i64
            ],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        count_tickets_created_after, count_tickets_with_status, custom_field_values,
        delete_tickets, get_category, get_ticket, get_user, insert_category, insert_user,
        list_tickets, list_tickets_with_status, resolution_events, ticket_history,
    };
    use crate::db::migrations;
    use crate::model::{
        Category, FieldDefinition, FieldType, Role, Status, User,
    };
    use rusqlite::{Connection, params};

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        conn.pragma_update(None, "foreign_keys", "ON").expect("fk pragma");
        migrations::migrate(&mut conn).expect("migrate");

        insert_user(
            &conn,
            &User {
                user_id: "usr-0000000a".into(),
                name: "Agent".into(),
                email: "agent@example.com".into(),
                role: Role::Agent,
            },
        )
        .expect("insert user");

        insert_category(
            &conn,
            &Category {
                category_id: "cat-0000000a".into(),
                name: "Access".into(),
                sla_first_response_hours: 2,
                sla_resolution_hours: 8,
                field_definitions: vec![
                    FieldDefinition {
                        field_id: "fld-0000000a".into(),
                        label: "Repository name".into(),
                        field_type: FieldType::Text,
                        is_required: true,
                    },
                    FieldDefinition {
                        field_id: "fld-0000000b".into(),
                        label: "Error log".into(),
                        field_type: FieldType::Textarea,
                        is_required: false,
                    },
                ],
            },
        )
        .expect("insert category");

        conn
    }

    fn insert_ticket(conn: &Connection, ticket_id: &str, status: Status, created_at_us: i64) {
        conn.execute(
            "INSERT INTO tickets (
                ticket_id, title, description, status, version, created_at_us,
                sla_first_response_target_us, sla_resolution_target_us,
                category_name_snapshot, requester_id, category_id
             ) VALUES (?1, 'Title', 'Body', ?2, 1, ?3, ?4, ?5,
                       'Access', 'usr-0000000a', 'cat-0000000a')",
            params![
                ticket_id,
                status.as_str(),
                created_at_us,
                created_at_us + 100,
                created_at_us + 200
            ],
        )
        .expect("insert ticket");
    }

    #[test]
    fn get_ticket_roundtrips_typed_fields() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::InProgress, 1_000);

        let ticket = get_ticket(&conn, "tk-00000001")
            .expect("query")
            .expect("present");
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.version, 1);
        assert_eq!(ticket.category_name_snapshot, "Access");

        assert!(get_ticket(&conn, "tk-missing0").expect("query").is_none());
    }

    #[test]
    fn list_tickets_orders_newest_first() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Open, 1_000);
        insert_ticket(&conn, "tk-00000002", Status::Open, 3_000);
        insert_ticket(&conn, "tk-00000003", Status::Open, 2_000);

        let ids: Vec<String> = list_tickets(&conn)
            .expect("list")
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        assert_eq!(ids, ["tk-00000002", "tk-00000003", "tk-00000001"]);
    }

    #[test]
    fn status_filters_and_counts() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Open, 1_000);
        insert_ticket(&conn, "tk-00000002", Status::InProgress, 2_000);
        insert_ticket(&conn, "tk-00000003", Status::Resolved, 3_000);
        insert_ticket(&conn, "tk-00000004", Status::Closed, 4_000);

        let open_work =
            list_tickets_with_status(&conn, &[Status::Open, Status::InProgress]).expect("list");
        assert_eq!(open_work.len(), 2);

        assert_eq!(
            count_tickets_with_status(&conn, &[Status::Resolved, Status::Closed]).expect("count"),
            2
        );
        assert_eq!(count_tickets_with_status(&conn, &[]).expect("count"), 0);

        assert_eq!(count_tickets_created_after(&conn, 2_000).expect("count"), 2);
        assert_eq!(count_tickets_created_after(&conn, 4_000).expect("count"), 0);
    }

    #[test]
    fn history_is_ordered_and_typed() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Resolved, 1_000);

        for (action, old, new, at) in [
            ("created", None::<&str>, None::<&str>, 1_000_i64),
            ("status_change", Some("open"), Some("in_progress"), 2_000),
            ("status_change", Some("in_progress"), Some("resolved"), 3_000),
        ] {
            conn.execute(
                "INSERT INTO ticket_history
                 (ticket_id, user_id, action, old_value, new_value, created_at_us)
                 VALUES ('tk-00000001', 'usr-0000000a', ?1, ?2, ?3, ?4)",
                params![action, old, new, at],
            )
            .expect("insert history");
        }

        let trail = ticket_history(&conn, "tk-00000001").expect("history");
        assert_eq!(trail.len(), 3);
        assert_eq!(trail[0].created_at_us, 1_000);
        assert_eq!(trail[2].old_status, Some(Status::InProgress));
        assert_eq!(trail[2].new_status, Some(Status::Resolved));
    }

    #[test]
    fn resolution_events_scan_ascending() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Resolved, 1_000);
        insert_ticket(&conn, "tk-00000002", Status::Resolved, 1_000);

        for (ticket, at) in [("tk-00000002", 5_000_i64), ("tk-00000001", 2_000)] {
            conn.execute(
                "INSERT INTO ticket_history
                 (ticket_id, user_id, action, old_value, new_value, created_at_us)
                 VALUES (?1, 'usr-0000000a', 'status_change', 'in_progress', 'resolved', ?2)",
                params![ticket, at],
            )
            .expect("insert history");
        }
        // A non-resolution change must not appear in the scan.
        conn.execute(
            "INSERT INTO ticket_history
             (ticket_id, user_id, action, old_value, new_value, created_at_us)
             VALUES ('tk-00000001', 'usr-0000000a', 'status_change', 'open', 'in_progress', 500)",
            [],
        )
        .expect("insert history");

        let events = resolution_events(&conn).expect("scan");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ticket_id, "tk-00000001");
        assert_eq!(events[0].created_at_us, 2_000);
        assert_eq!(events[1].ticket_id, "tk-00000002");
    }

    #[test]
    fn custom_field_values_join_labels_in_order() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Open, 1_000);
        for (field, value) in [("fld-0000000b", "trace"), ("fld-0000000a", "desk/core")] {
            conn.execute(
                "INSERT INTO ticket_custom_field_values (ticket_id, field_id, value)
                 VALUES ('tk-00000001', ?1, ?2)",
                params![field, value],
            )
            .expect("insert value");
        }

        let values = custom_field_values(&conn, "tk-00000001").expect("values");
        assert_eq!(values.len(), 2);
        assert_eq!(values[0].label, "Repository name");
        assert_eq!(values[0].value, "desk/core");
        assert_eq!(values[1].label, "Error log");
    }

    #[test]
    fn category_comes_back_with_ordered_fields() {
        let conn = test_conn();
        let category = get_category(&conn, "cat-0000000a")
            .expect("query")
            .expect("present");
        assert_eq!(category.sla_resolution_hours, 8);
        assert_eq!(category.field_definitions.len(), 2);
        assert_eq!(category.field_definitions[0].label, "Repository name");
        assert!(category.field_definitions[0].is_required);
    }

    #[test]
    fn get_user_parses_role() {
        let conn = test_conn();
        let user = get_user(&conn, "usr-0000000a")
            .expect("query")
            .expect("present");
        assert_eq!(user.role, Role::Agent);
        assert!(get_user(&conn, "usr-missing0").expect("query").is_none());
    }

    #[test]
    fn delete_tickets_cascades_children() {
        let conn = test_conn();
        insert_ticket(&conn, "tk-00000001", Status::Open, 1_000);
        insert_ticket(&conn, "tk-00000002", Status::Open, 2_000);
        conn.execute(
            "INSERT INTO ticket_history (ticket_id, user_id, action, created_at_us)
             VALUES ('tk-00000001', 'usr-0000000a', 'created', 1000)",
            [],
        )
        .expect("insert history");

        let removed = delete_tickets(
            &conn,
            &["tk-00000001".to_string(), "tk-missing0".to_string()],
        )
        .expect("delete");
        assert_eq!(removed, 1);

        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM ticket_history WHERE ticket_id = 'tk-00000001'",
                [],
                |row| row.get(0),
            )
            .expect("count");
        assert_eq!(orphans, 0);
        assert!(get_ticket(&conn, "tk-00000002").expect("query").is_some());
    }
}
