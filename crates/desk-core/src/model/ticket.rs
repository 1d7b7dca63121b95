use super::{HistoryEntry, ParseEnumError, normalize};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The four lifecycle states of a ticket.
///
/// `Open` is the only initial state; `Closed` is terminal. Which
/// transitions between them are legal depends on the acting role — see
/// [`crate::permission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl Status {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }

    /// Whether this state has no outgoing transitions for any role.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Whether a ticket in this state counts as open work for reporting.
    #[must_use]
    pub const fn is_open_work(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

/// A persisted ticket row.
///
/// `version` is the optimistic-concurrency token: it starts at 1 and
/// increments by exactly 1 on every accepted status change. Identity,
/// requester, category snapshot, and both SLA targets are write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id: String,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub version: i64,
    pub created_at_us: i64,
    pub sla_first_response_target_us: i64,
    pub sla_resolution_target_us: i64,
    /// Copy of the category name at creation time, so later renames do
    /// not retroactively change historical tickets.
    pub category_name_snapshot: String,
    pub requester_id: String,
    pub category_id: String,
}

/// A custom field value captured at ticket creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub field_id: String,
    pub label: String,
    pub value: String,
}

/// Input for one custom field value on a new ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFieldValue {
    pub field_id: String,
    pub value: String,
}

/// Input to [`crate::engine::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category_id: String,
    /// The authenticated caller opening the ticket. Always explicit;
    /// the engine never guesses a requester on the caller's behalf.
    pub requester_id: String,
    pub custom_field_values: Vec<NewFieldValue>,
}

/// A ticket joined with its ordered audit trail and field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub custom_field_values: Vec<CustomFieldValue>,
    pub history: Vec<HistoryEntry>,
}
