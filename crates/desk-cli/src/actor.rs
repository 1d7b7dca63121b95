//! Acting-user resolution.
//!
//! Mutating commands act on behalf of a user the identity layer has
//! already authenticated; the CLI stands in for that layer. `--as`
//! wins, then `actor.default` from the store config, and the id must
//! resolve to a stored user.

use anyhow::{Result, bail};
use desk_core::config::ProjectConfig;
use desk_core::db::query;
use desk_core::model::User;
use rusqlite::Connection;

/// Resolve the acting user for a mutating command.
///
/// # Errors
///
/// Returns an error when no actor id is supplied anywhere or the id
/// does not resolve to a stored user.
pub fn resolve(conn: &Connection, flag: Option<&str>, config: &ProjectConfig) -> Result<User> {
    let Some(user_id) = flag.or(config.actor.default.as_deref()) else {
        bail!("no acting user: pass --as <user-id> or set actor.default in the store config");
    };
    match query::get_user(conn, user_id)? {
        Some(user) => Ok(user),
        None => bail!("user not found: {user_id}"),
    }
}
