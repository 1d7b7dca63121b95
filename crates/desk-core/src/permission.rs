//! Role/transition permission matrix.
//!
//! A pure, exhaustively enumerable lookup: `(role, from) -> allowed to`.
//! Every `(role, from)` pair has an explicit arm below, so each of the
//! 48 `(role, from, to)` triples has an intentional yes/no answer with no
//! wildcard falling through to an undefined "deny".

use crate::model::{Role, Status};

/// The target statuses `role` may move a ticket to from `from`.
///
/// | role      | open          | in_progress | resolved                |
/// |-----------|---------------|-------------|-------------------------|
/// | agent     | in_progress   | resolved    | closed                  |
/// | manager   | in_progress   | resolved    | in_progress, closed     |
/// | requester | —             | —           | in_progress, closed     |
///
/// `closed` is terminal: no role has an outgoing row for it.
#[must_use]
pub const fn allowed_targets(role: Role, from: Status) -> &'static [Status] {
    match (role, from) {
        (Role::Agent, Status::Open) => &[Status::InProgress],
        (Role::Agent, Status::InProgress) => &[Status::Resolved],
        (Role::Agent, Status::Resolved) => &[Status::Closed],
        (Role::Agent, Status::Closed) => &[],

        (Role::Manager, Status::Open) => &[Status::InProgress],
        (Role::Manager, Status::InProgress) => &[Status::Resolved],
        (Role::Manager, Status::Resolved) => &[Status::InProgress, Status::Closed],
        (Role::Manager, Status::Closed) => &[],

        (Role::Requester, Status::Open) => &[],
        (Role::Requester, Status::InProgress) => &[],
        (Role::Requester, Status::Resolved) => &[Status::InProgress, Status::Closed],
        (Role::Requester, Status::Closed) => &[],
    }
}

/// Whether `role` may move a ticket from `from` to `to`.
#[must_use]
pub fn is_allowed(role: Role, from: Status, to: Status) -> bool {
    allowed_targets(role, from).contains(&to)
}
