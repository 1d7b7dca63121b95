//! Opaque id generation.
//!
//! Ids are a short type prefix plus a random hex suffix (`tk-9f2c41d8`).
//! The prefix makes ids self-describing in logs and CLI output; the
//! store's primary-key constraint catches the (unlikely) collision.

use rand::Rng;

/// Generate a ticket id (`tk-xxxxxxxx`).
#[must_use]
pub fn ticket_id() -> String {
    generate("tk")
}

/// Generate a category id (`cat-xxxxxxxx`).
#[must_use]
pub fn category_id() -> String {
    generate("cat")
}

/// Generate a custom field id (`fld-xxxxxxxx`).
#[must_use]
pub fn field_id() -> String {
    generate("fld")
}

/// Generate a user id (`usr-xxxxxxxx`).
#[must_use]
pub fn user_id() -> String {
    generate("usr")
}

fn generate(prefix: &str) -> String {
    let suffix: u32 = rand::thread_rng().r#gen();
    format!("{prefix}-{suffix:08x}")
}
