//! End-to-end lifecycle tests: the permission matrix driven through the
//! engine, the optimistic-concurrency protocol, and the audit trail's
//! replay guarantee.

use desk_core::db::{migrations, query};
use desk_core::error::EngineError;
use desk_core::model::{
    ActionKind, Category, FieldDefinition, FieldType, NewFieldValue, NewTicket, Role, Status, User,
};
use desk_core::{engine, permission};
use rusqlite::{Connection, params};

const T0: i64 = 1_704_067_200_000_000; // 2024-01-01T00:00:00Z

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn user_for(role: Role) -> User {
    let (id, name, email) = match role {
        Role::Requester => ("usr-req00001", "Ana", "ana@example.com"),
        Role::Agent => ("usr-agt00001", "Carlos", "carlos@example.com"),
        Role::Manager => ("usr-mgr00001", "María", "maria@example.com"),
    };
    User {
        user_id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
    }
}

fn test_db() -> Connection {
    let mut conn = Connection::open_in_memory().expect("open in-memory db");
    conn.pragma_update(None, "foreign_keys", "ON")
        .expect("fk pragma");
    migrations::migrate(&mut conn).expect("migrate schema");

    for role in Role::ALL {
        query::insert_user(&conn, &user_for(role)).expect("insert user");
    }
    query::insert_category(
        &conn,
        &Category {
            category_id: "cat-access01".into(),
            name: "GitHub repository access".into(),
            sla_first_response_hours: 2,
            sla_resolution_hours: 8,
            field_definitions: vec![FieldDefinition {
                field_id: "fld-repo0001".into(),
                label: "Repository name".into(),
                field_type: FieldType::Text,
                is_required: true,
            }],
        },
    )
    .expect("insert category");
    conn
}

fn open_ticket(conn: &mut Connection) -> String {
    let ticket = engine::create(
        conn,
        &NewTicket {
            title: "Cannot push to main".into(),
            description: "Permission denied since this morning.".into(),
            category_id: "cat-access01".into(),
            requester_id: "usr-req00001".into(),
            custom_field_values: vec![NewFieldValue {
                field_id: "fld-repo0001".into(),
                value: "desk/core".into(),
            }],
        },
        T0,
    )
    .expect("create ticket");
    ticket.ticket_id
}

/// Force a ticket into `status` directly, simulating prior history
/// without walking the matrix (version stays at 1).
fn force_status(conn: &Connection, ticket_id: &str, status: Status) {
    conn.execute(
        "UPDATE tickets SET status = ?1 WHERE ticket_id = ?2",
        params![status.as_str(), ticket_id],
    )
    .expect("force status");
}

// ---------------------------------------------------------------------------
// Permission matrix, exhaustively, through the engine
// ---------------------------------------------------------------------------

#[test]
fn engine_agrees_with_the_matrix_on_all_48_triples() {
    for role in Role::ALL {
        for from in Status::ALL {
            for to in Status::ALL {
                let mut conn = test_db();
                let ticket_id = open_ticket(&mut conn);
                force_status(&conn, &ticket_id, from);

                let result =
                    engine::change_status(&mut conn, &ticket_id, to, 1, &user_for(role), T0 + 1);
                let allowed = permission::is_allowed(role, from, to);

                let detail = engine::get_ticket(&conn, &ticket_id).expect("detail");
                if allowed {
                    let updated = result.unwrap_or_else(|err| {
                        panic!("({role}, {from}, {to}) should be allowed, got {err}")
                    });
                    assert_eq!(updated.status, to);
                    assert_eq!(updated.version, 2);
                    assert_eq!(detail.history.len(), 2);
                    let change = &detail.history[1];
                    assert_eq!(change.action, ActionKind::StatusChange);
                    assert_eq!(change.old_status, Some(from));
                    assert_eq!(change.new_status, Some(to));
                } else {
                    let err = result.err().unwrap_or_else(|| {
                        panic!("({role}, {from}, {to}) should be forbidden")
                    });
                    assert!(
                        matches!(err, EngineError::Forbidden { .. }),
                        "({role}, {from}, {to}) expected Forbidden, got {err}"
                    );
                    assert_eq!(detail.ticket.status, from, "state must not change");
                    assert_eq!(detail.ticket.version, 1, "version must not change");
                    assert_eq!(detail.history.len(), 1, "no history must be written");
                }
            }
        }
    }
}

#[test]
fn agent_cannot_send_work_backwards() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);
    let agent = user_for(Role::Agent);

    let updated =
        engine::change_status(&mut conn, &ticket_id, Status::InProgress, 1, &agent, T0 + 1)
            .expect("open -> in_progress is an agent move");

    let err = engine::change_status(
        &mut conn,
        &ticket_id,
        Status::Open,
        updated.version,
        &agent,
        T0 + 2,
    )
    .expect_err("in_progress -> open is not in the table");
    assert!(matches!(err, EngineError::Forbidden { .. }));
}

#[test]
fn requester_cannot_pick_up_their_own_ticket() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);

    let err = engine::change_status(
        &mut conn,
        &ticket_id,
        Status::InProgress,
        1,
        &user_for(Role::Requester),
        T0 + 1,
    )
    .expect_err("requester has no rule out of open");
    assert!(matches!(err, EngineError::Forbidden { .. }));
}

// ---------------------------------------------------------------------------
// Optimistic concurrency
// ---------------------------------------------------------------------------

#[test]
fn two_editors_with_the_same_version_serialize_to_one_winner() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);
    let agent = user_for(Role::Agent);
    let manager = user_for(Role::Manager);

    // Walk the ticket to version 3.
    engine::change_status(&mut conn, &ticket_id, Status::InProgress, 1, &agent, T0 + 1)
        .expect("to in_progress");
    engine::change_status(&mut conn, &ticket_id, Status::Resolved, 2, &agent, T0 + 2)
        .expect("to resolved");

    // Both editors read the ticket at version 3 and submit concurrently;
    // the store serializes them and exactly one wins.
    let first = engine::change_status(
        &mut conn,
        &ticket_id,
        Status::InProgress,
        3,
        &manager,
        T0 + 3,
    )
    .expect("first editor wins");
    assert_eq!(first.version, 4);

    let err = engine::change_status(&mut conn, &ticket_id, Status::Closed, 3, &manager, T0 + 4)
        .expect_err("second editor conflicts");
    match err {
        EngineError::Conflict { expected, stored, .. } => {
            assert_eq!(expected, 3);
            assert_eq!(stored, 4);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // The loser retries with the fresh version and succeeds.
    let retried = engine::change_status(
        &mut conn,
        &ticket_id,
        Status::Resolved,
        first.version,
        &manager,
        T0 + 5,
    )
    .expect("retry with refreshed version");
    assert_eq!(retried.version, 5);
}

#[test]
fn version_grows_by_exactly_one_per_accepted_write() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);
    let agent = user_for(Role::Agent);

    let mut version = 1;
    for (to, at) in [
        (Status::InProgress, T0 + 1),
        (Status::Resolved, T0 + 2),
        (Status::Closed, T0 + 3),
    ] {
        let updated = engine::change_status(&mut conn, &ticket_id, to, version, &agent, at)
            .expect("accepted write");
        assert_eq!(updated.version, version + 1);
        version = updated.version;
    }

    let detail = engine::get_ticket(&conn, &ticket_id).expect("detail");
    assert_eq!(detail.ticket.version, 4);
    assert_eq!(detail.history.len(), 4); // created + three changes
}

// ---------------------------------------------------------------------------
// Audit trail
// ---------------------------------------------------------------------------

#[test]
fn history_reconstructs_every_status_the_ticket_held() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);
    let agent = user_for(Role::Agent);
    let manager = user_for(Role::Manager);

    let walk = [
        (Status::InProgress, &agent),
        (Status::Resolved, &agent),
        (Status::InProgress, &manager), // reopen
        (Status::Resolved, &agent),
        (Status::Closed, &manager),
    ];
    let mut version = 1;
    for (idx, (to, acting)) in walk.iter().enumerate() {
        let at = T0 + 1 + i64::try_from(idx).expect("small index");
        version = engine::change_status(&mut conn, &ticket_id, *to, version, acting, at)
            .expect("walk transition")
            .version;
    }

    let detail = engine::get_ticket(&conn, &ticket_id).expect("detail");
    assert_eq!(detail.history[0].action, ActionKind::Created);

    // Replaying the ordered trail yields the exact status sequence.
    let mut replayed = vec![Status::Open];
    for entry in &detail.history[1..] {
        assert_eq!(entry.action, ActionKind::StatusChange);
        assert_eq!(
            entry.old_status,
            Some(*replayed.last().expect("non-empty")),
            "each entry chains from the previous status"
        );
        replayed.push(entry.new_status.expect("status_change has new_value"));
    }
    assert_eq!(
        replayed,
        vec![
            Status::Open,
            Status::InProgress,
            Status::Resolved,
            Status::InProgress,
            Status::Resolved,
            Status::Closed,
        ]
    );
}

#[test]
fn comments_are_open_to_every_role_in_every_status() {
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);
    let agent = user_for(Role::Agent);

    // Close the ticket completely.
    engine::change_status(&mut conn, &ticket_id, Status::InProgress, 1, &agent, T0 + 1)
        .expect("to in_progress");
    engine::change_status(&mut conn, &ticket_id, Status::Resolved, 2, &agent, T0 + 2)
        .expect("to resolved");
    engine::change_status(&mut conn, &ticket_id, Status::Closed, 3, &agent, T0 + 3)
        .expect("to closed");

    for (idx, role) in Role::ALL.into_iter().enumerate() {
        let at = T0 + 10 + i64::try_from(idx).expect("small index");
        engine::add_comment(
            &mut conn,
            &ticket_id,
            "Following up on the closure.",
            &user_for(role),
            at,
        )
        .expect("comment on closed ticket");
    }

    let detail = engine::get_ticket(&conn, &ticket_id).expect("detail");
    assert_eq!(detail.ticket.version, 4, "comments never bump the version");
    let comments = detail
        .history
        .iter()
        .filter(|entry| entry.action == ActionKind::CommentAdded)
        .count();
    assert_eq!(comments, 3);
}

// ---------------------------------------------------------------------------
// Creation scenario
// ---------------------------------------------------------------------------

#[test]
fn eight_hour_sla_from_midnight_lands_at_eight_am() {
    // Category with an 8h resolution SLA, ticket opened at midnight UTC:
    // the resolution target lands exactly at 08:00.
    let mut conn = test_db();
    let ticket_id = open_ticket(&mut conn);

    let detail = engine::get_ticket(&conn, &ticket_id).expect("detail");
    let eight_am_us = T0 + 8 * 3_600 * 1_000_000;
    assert_eq!(detail.ticket.sla_resolution_target_us, eight_am_us);
    assert_eq!(detail.ticket.status, Status::Open);
    assert_eq!(detail.ticket.version, 1);
    assert_eq!(detail.history.len(), 1);
    assert_eq!(detail.history[0].action, ActionKind::Created);
}
