//! Canonical SQLite schema for the desk store.
//!
//! The schema is normalized around the lifecycle invariants:
//! - `tickets` keeps the mutable status/version pair plus the write-once
//!   creation fields (SLA targets, category snapshot, requester)
//! - `ticket_history` is append-only; nothing in the code updates or
//!   deletes rows from it
//! - `users`, `categories`, and `custom_fields` are reference data the
//!   engine consumes read-only
//! - `store_meta` tracks the applied schema version

/// Migration v1: core tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL CHECK (role IN ('requester', 'agent', 'manager'))
);

CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    sla_first_response_hours INTEGER NOT NULL CHECK (sla_first_response_hours >= 0),
    sla_resolution_hours INTEGER NOT NULL CHECK (sla_resolution_hours >= 0)
);

CREATE TABLE IF NOT EXISTS custom_fields (
    field_id TEXT PRIMARY KEY,
    category_id TEXT NOT NULL REFERENCES categories(category_id) ON DELETE CASCADE,
    label TEXT NOT NULL CHECK (length(trim(label)) > 0),
    field_type TEXT NOT NULL DEFAULT 'text'
        CHECK (field_type IN ('text', 'textarea', 'select')),
    is_required INTEGER NOT NULL DEFAULT 0 CHECK (is_required IN (0, 1)),
    position INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS tickets (
    ticket_id TEXT PRIMARY KEY CHECK (ticket_id LIKE 'tk-%'),
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    description TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'open'
        CHECK (status IN ('open', 'in_progress', 'resolved', 'closed')),
    version INTEGER NOT NULL DEFAULT 1 CHECK (version >= 1),
    created_at_us INTEGER NOT NULL,
    sla_first_response_target_us INTEGER NOT NULL,
    sla_resolution_target_us INTEGER NOT NULL,
    category_name_snapshot TEXT NOT NULL,
    requester_id TEXT NOT NULL REFERENCES users(user_id),
    category_id TEXT NOT NULL REFERENCES categories(category_id)
);

CREATE TABLE IF NOT EXISTS ticket_custom_field_values (
    value_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id) ON DELETE CASCADE,
    field_id TEXT NOT NULL REFERENCES custom_fields(field_id),
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ticket_history (
    history_id INTEGER PRIMARY KEY AUTOINCREMENT,
    ticket_id TEXT NOT NULL REFERENCES tickets(ticket_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL REFERENCES users(user_id),
    action TEXT NOT NULL CHECK (action IN ('created', 'status_change', 'comment_added')),
    old_value TEXT CHECK (
        old_value IS NULL
        OR old_value IN ('open', 'in_progress', 'resolved', 'closed')
    ),
    new_value TEXT CHECK (
        new_value IS NULL
        OR new_value IN ('open', 'in_progress', 'resolved', 'closed')
    ),
    comment TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
"#;

/// Migration v2: read-path indexes for listing, history replay, and the
/// compliance scan.
pub const MIGRATION_V2_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_tickets_status_created
    ON tickets(status, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_tickets_created
    ON tickets(created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_history_ticket_created
    ON ticket_history(ticket_id, created_at_us);

CREATE INDEX IF NOT EXISTS idx_history_action_new_value
    ON ticket_history(action, new_value, created_at_us);

CREATE INDEX IF NOT EXISTS idx_custom_fields_category
    ON custom_fields(category_id, position);

CREATE INDEX IF NOT EXISTS idx_field_values_ticket
    ON ticket_custom_field_values(ticket_id);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
"#;

/// Indexes expected by the list/report query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_tickets_status_created",
    "idx_tickets_created",
    "idx_history_ticket_created",
    "idx_history_action_new_value",
    "idx_custom_fields_category",
    "idx_field_values_ticket",
];

#[cfg(test)]
mod tests {
    use crate::db::migrations;
    use rusqlite::{Connection, params};

    fn seeded_conn() -> rusqlite::Result<Connection> {
        let mut conn = Connection::open_in_memory()?;
        migrations::migrate(&mut conn)?;

        conn.execute(
            "INSERT INTO users (user_id, name, email, role)
             VALUES ('usr-0000000a', 'Agent', 'agent@example.com', 'agent')",
            [],
        )?;
        conn.execute(
            "INSERT INTO categories (category_id, name, sla_first_response_hours, sla_resolution_hours)
             VALUES ('cat-0000000a', 'Access', 2, 8)",
            [],
        )?;

        for idx in 0..24_u32 {
            let ticket_id = format!("tk-{idx:08x}");
            let status = if idx % 2 == 0 { "open" } else { "resolved" };
            conn.execute(
                "INSERT INTO tickets (
                    ticket_id, title, description, status, version,
                    created_at_us, sla_first_response_target_us,
                    sla_resolution_target_us, category_name_snapshot,
                    requester_id, category_id
                 ) VALUES (?1, ?2, 'body', ?3, 1, ?4, ?5, ?6, 'Access',
                           'usr-0000000a', 'cat-0000000a')",
                params![
                    ticket_id,
                    format!("Ticket {idx}"),
                    status,
                    i64::from(idx),
                    i64::from(idx) + 100,
                    i64::from(idx) + 200,
                ],
            )?;

            conn.execute(
                "INSERT INTO ticket_history (
                    ticket_id, user_id, action, new_value, created_at_us
                 ) VALUES (?1, 'usr-0000000a', 'status_change', 'resolved', ?2)",
                params![format!("tk-{idx:08x}"), i64::from(idx) + 50],
            )?;
        }

        Ok(conn)
    }

    fn query_plan_details(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<String>> {
        let mut stmt = conn.prepare(&format!("EXPLAIN QUERY PLAN {sql}"))?;
        stmt.query_map([], |row| row.get::<_, String>(3))?
            .collect::<Result<Vec<_>, _>>()
    }

    #[test]
    fn query_plan_uses_status_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT ticket_id
             FROM tickets
             WHERE status = 'open'
             ORDER BY created_at_us DESC",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_tickets_status_created")),
            "expected status index in plan, got: {details:?}"
        );

        Ok(())
    }

    #[test]
    fn query_plan_uses_resolution_scan_index() -> rusqlite::Result<()> {
        let conn = seeded_conn()?;
        let details = query_plan_details(
            &conn,
            "SELECT ticket_id, created_at_us
             FROM ticket_history
             WHERE action = 'status_change' AND new_value = 'resolved'
             ORDER BY created_at_us",
        )?;

        assert!(
            details
                .iter()
                .any(|detail| detail.contains("idx_history_action_new_value")),
            "expected resolution-scan index in plan, got: {details:?}"
        );

        Ok(())
    }

    #[test]
    fn history_rejects_unknown_action() {
        let conn = seeded_conn().expect("seed");
        let result = conn.execute(
            "INSERT INTO ticket_history (ticket_id, user_id, action, created_at_us)
             VALUES ('tk-00000000', 'usr-0000000a', 'ticket_created', 1)",
            [],
        );
        assert!(result.is_err(), "legacy action name must be rejected");
    }

    #[test]
    fn tickets_reject_foreign_status() {
        let conn = seeded_conn().expect("seed");
        let result = conn.execute(
            "UPDATE tickets SET status = 'pending' WHERE ticket_id = 'tk-00000000'",
            [],
        );
        assert!(result.is_err());
    }
}
