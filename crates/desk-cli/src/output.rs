//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its
//! output accordingly: readable text for humans, stable JSON for
//! scripts and dashboards.

use chrono::{DateTime, Local, Utc};
use desk_core::EngineError;
use serde::Serialize;
use std::io::{self, Write};

/// The two output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per result, or a JSON array).
    Json,
}

/// Render `value` to stdout in the requested mode.
///
/// The `human` closure formats the human variant; JSON output is the
/// serde serialization of `value` as-is.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn render<T, F>(mode: OutputMode, value: &T, human: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut dyn Write) -> io::Result<()>,
{
    let stdout = io::stdout();
    let mut w = stdout.lock();
    match mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(w, "{json}")
        }
        OutputMode::Human => human(value, &mut w),
    }
}

/// Render a microsecond timestamp as local wall-clock time.
pub fn fmt_timestamp_us(us: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(us).map_or_else(
        || format!("@{us}us"),
        |ts| {
            ts.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        },
    )
}

/// Error payload shared by both output modes.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<&'static str>,
}

impl CliError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            hint: None,
        }
    }
}

impl From<&EngineError> for CliError {
    fn from(err: &EngineError) -> Self {
        let code = err.code();
        Self {
            error: err.to_string(),
            code: Some(code.code()),
            hint: code.hint(),
        }
    }
}

/// Render an error to stderr in the requested mode.
///
/// # Errors
///
/// Returns an error if writing to stderr fails.
pub fn render_error(mode: OutputMode, err: &CliError) -> io::Result<()> {
    let stderr = io::stderr();
    let mut w = stderr.lock();
    match mode {
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(err)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(w, "{json}")
        }
        OutputMode::Human => {
            match err.code {
                Some(code) => writeln!(w, "error[{code}]: {}", err.error)?,
                None => writeln!(w, "error: {}", err.error)?,
            }
            if let Some(hint) = err.hint {
                writeln!(w, "  hint: {hint}")?;
            }
            Ok(())
        }
    }
}
