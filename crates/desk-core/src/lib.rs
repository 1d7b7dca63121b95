//! desk-core library.
//!
//! The ticket lifecycle engine and everything it leans on: the status
//! state machine, the role/transition permission matrix, the SLA clock,
//! the append-only audit trail, the SQLite store, and the read-only
//! aggregation reporter.

pub mod audit;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod id;
pub mod model;
pub mod permission;
pub mod report;
pub mod seed;
pub mod sla;

pub use error::EngineError;

/// # Conventions
///
/// - **Errors**: the engine surface returns `Result<T, EngineError>`;
///   db plumbing and everything below returns `anyhow::Result` or
///   `rusqlite::Result` as appropriate.
/// - **Logging**: use `tracing` macros (`info!`, `warn!`, `debug!`).
/// - **Time**: wall-clock instants are `i64` microseconds since the Unix
///   epoch, acquired by the caller and threaded through as `now_us`.
pub type Result<T> = std::result::Result<T, EngineError>;
