//! `dk kpis` — dashboard numbers from the aggregation reporter.

use crate::output::{CliError, OutputMode, render, render_error};
use crate::store;
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use desk_core::report;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct KpisArgs {
    /// Override the recent-volume window, in days.
    #[arg(long, value_name = "DAYS")]
    pub window_days: Option<i64>,
}

/// Execute `dk kpis`.
///
/// # Errors
///
/// Returns an error when any reporter scan fails.
pub fn run_kpis(args: &KpisArgs, output: OutputMode, store_path: &Path) -> Result<()> {
    let conn = store::open_existing(store_path)?;
    let config = store::load_config(store_path)?;

    let window_days = args.window_days.unwrap_or(config.report.window_days);

    match report::kpis(&conn, Utc::now().timestamp_micros(), window_days) {
        Ok(kpis) => {
            render(output, &kpis, |kpis, w| {
                writeln!(w, "Open tickets:    {}", kpis.open_tickets)?;
                writeln!(
                    w,
                    "Created (last {}d): {}",
                    kpis.window_days, kpis.recent_volume
                )?;
                writeln!(w, "SLA compliance:  {:.1}%", kpis.sla_compliance_pct)?;
                Ok(())
            })?;
            Ok(())
        }
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err.into())
        }
    }
}
