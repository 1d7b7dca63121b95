use super::{ParseEnumError, Status, normalize};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three kinds of audit event a ticket can accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Created,
    StatusChange,
    CommentAdded,
}

impl ActionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChange => "status_change",
            Self::CommentAdded => "comment_added",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "created" => Ok(Self::Created),
            "status_change" => Ok(Self::StatusChange),
            "comment_added" => Ok(Self::CommentAdded),
            _ => Err(ParseEnumError {
                expected: "action kind",
                got: s.to_string(),
            }),
        }
    }
}

/// One immutable entry in a ticket's audit trail.
///
/// `old_status`/`new_status` are populated only for `status_change`
/// entries, `comment` only for `comment_added`. The full sequence for a
/// ticket, ordered by `created_at_us`, reconstructs every status value
/// the ticket ever held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub ticket_id: String,
    pub user_id: String,
    pub action: ActionKind,
    pub old_status: Option<Status>,
    pub new_status: Option<Status>,
    pub comment: Option<String>,
    pub created_at_us: i64,
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.created_at_us,
            self.user_id,
            self.action,
            match self.action {
                ActionKind::Created => "opened".to_string(),
                ActionKind::StatusChange => format!(
                    "{} -> {}",
                    self.old_status.map_or("?", Status::as_str),
                    self.new_status.map_or("?", Status::as_str),
                ),
                ActionKind::CommentAdded => {
                    let body = self.comment.as_deref().unwrap_or("");
                    if body.len() > 40 {
                        format!("{}...", &body[..40])
                    } else {
                        body.to_string()
                    }
                }
            }
        )
    }
}
