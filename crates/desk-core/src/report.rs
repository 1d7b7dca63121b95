//! Read-only aggregation reporter.
//!
//! Fleet-wide KPIs computed by scanning tickets and history. Every
//! number is a live snapshot at the query instant; nothing here is
//! cached and nothing here mutates the store or carries lifecycle
//! invariants of its own.

use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::{
    Result,
    db::query,
    model::Status,
    sla::{self, ComplianceCase},
};

/// Default trailing window for [`recent_volume`], in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

const MICROS_PER_DAY: i64 = 24 * sla::MICROS_PER_HOUR;

/// The dashboard aggregate.
#[derive(Debug, Clone, Serialize)]
pub struct Kpis {
    pub open_tickets: i64,
    pub recent_volume: i64,
    pub window_days: i64,
    pub sla_compliance_pct: f64,
}

/// Count of tickets currently in `open` or `in_progress`.
///
/// # Errors
///
/// Returns an error if the scan fails.
pub fn open_ticket_count(conn: &Connection) -> Result<i64> {
    Ok(query::count_tickets_with_status(
        conn,
        &[Status::Open, Status::InProgress],
    )?)
}

/// Count of tickets created within the trailing `window_days` from
/// `now_us`.
///
/// # Errors
///
/// Returns an error if the scan fails.
pub fn recent_volume(conn: &Connection, now_us: i64, window_days: i64) -> Result<i64> {
    let cutoff_us = now_us - window_days * MICROS_PER_DAY;
    Ok(query::count_tickets_created_after(conn, cutoff_us)?)
}

/// SLA compliance percentage over all resolved/closed tickets.
///
/// Each settled ticket is judged by its *first* transition to
/// `resolved`; see [`sla::compliance_percentage`] for the aggregation
/// rules (including the vacuous 100% when nothing is settled).
///
/// # Errors
///
/// Returns an error if either scan fails.
pub fn sla_compliance(conn: &Connection) -> Result<f64> {
    let settled = query::list_tickets_with_status(conn, &[Status::Resolved, Status::Closed])?;

    // Events come back ordered by creation time ascending, so the first
    // insert per ticket wins and reopen/re-resolve cycles are ignored.
    let mut first_resolved: HashMap<String, i64> = HashMap::new();
    for event in query::resolution_events(conn)? {
        first_resolved
            .entry(event.ticket_id)
            .or_insert(event.created_at_us);
    }

    let cases: Vec<ComplianceCase> = settled
        .iter()
        .map(|ticket| ComplianceCase {
            target_us: ticket.sla_resolution_target_us,
            first_resolved_at_us: first_resolved.get(&ticket.ticket_id).copied(),
        })
        .collect();

    debug!(settled = cases.len(), "sla compliance inputs gathered");
    Ok(sla::compliance_percentage(&cases))
}

/// All three KPIs in one pass, as the dashboard consumes them.
///
/// # Errors
///
/// Returns an error if any underlying scan fails.
pub fn kpis(conn: &Connection, now_us: i64, window_days: i64) -> Result<Kpis> {
    Ok(Kpis {
        open_tickets: open_ticket_count(conn)?,
        recent_volume: recent_volume(conn, now_us, window_days)?,
        window_days,
        sla_compliance_pct: sla_compliance(conn)?,
    })
}
