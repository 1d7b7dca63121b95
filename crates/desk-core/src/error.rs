use crate::model::{Role, Status};
use std::fmt;

/// Machine-readable error codes for client-side decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    ForbiddenTransition,
    VersionConflict,
    InvalidInput,
    StoreFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "E2001",
            Self::ForbiddenTransition => "E2002",
            Self::VersionConflict => "E2003",
            Self::InvalidInput => "E2004",
            Self::StoreFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "Referenced record not found",
            Self::ForbiddenTransition => "Role lacks permission for this transition",
            Self::VersionConflict => "Ticket modified by someone else",
            Self::InvalidInput => "Invalid input",
            Self::StoreFailure => "Ticket store failure",
        }
    }

    /// Optional remediation hint that can be surfaced to callers.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotFound => None,
            Self::ForbiddenTransition => {
                Some("Follow the lifecycle: open -> in_progress -> resolved -> closed.")
            }
            Self::VersionConflict => {
                Some("Refresh the ticket to get its current version, then resubmit.")
            }
            Self::InvalidInput => Some("Fix the rejected field and retry."),
            Self::StoreFailure => Some("Check the store file and disk state, then retry."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors surfaced by the lifecycle engine.
///
/// The first four variants are the caller-visible outcomes of the
/// lifecycle operations; `Store` wraps SQLite failures from the
/// persistence layer. `NotFound`, `Forbidden`, and `Validation` are
/// detected before any mutation; `Conflict` is detected inside the
/// update transaction, before commit. None leave a partial write.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A referenced ticket, category, or user does not exist.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },

    /// The acting role has no rule allowing this transition.
    #[error("role '{role}' may not move a ticket from '{from}' to '{to}'")]
    Forbidden {
        role: Role,
        from: Status,
        to: Status,
    },

    /// The submitted version no longer matches the stored row.
    #[error(
        "ticket {id} was modified by someone else (submitted version {expected}, stored {stored})"
    )]
    Conflict {
        id: String,
        expected: i64,
        stored: i64,
    },

    /// Input rejected before any store access.
    #[error("{reason}")]
    Validation { reason: String },

    /// SQLite failure underneath a lifecycle operation.
    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}

impl EngineError {
    /// The stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Forbidden { .. } => ErrorCode::ForbiddenTransition,
            Self::Conflict { .. } => ErrorCode::VersionConflict,
            Self::Validation { .. } => ErrorCode::InvalidInput,
            Self::Store(_) => ErrorCode::StoreFailure,
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}
