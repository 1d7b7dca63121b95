#![forbid(unsafe_code)]

//! `dk` — the desk command-line surface.
//!
//! Thin shell over `desk-core`: every subcommand opens the SQLite
//! store, calls one engine or reporter operation, and renders the
//! result through the shared output layer.

mod actor;
mod cmd;
mod output;
mod store;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "desk: service-desk ticket tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the ticket store.
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        default_value = ".desk/desk.db"
    )]
    store: PathBuf,

    /// Act as this user id (overrides `actor.default` from config).
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    fn actor_flag(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a desk store",
        long_about = "Create the SQLite ticket store and a default config next to it.",
        after_help = "EXAMPLES:\n    # Create the store under .desk/\n    dk init\n\n    # Create and seed demo users and categories\n    dk init --demo\n\n    # Emit machine-readable output\n    dk init --demo --json"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Open a new ticket",
        long_about = "Open a ticket in a category; SLA targets are stamped from the category's budgets.",
        after_help = "EXAMPLES:\n    # Open a ticket as a specific requester\n    dk create --title \"Cannot push to main\" --category cat-12ab34cd --as usr-12ab34cd\n\n    # Attach custom field values\n    dk create --title \"CI is red\" --category cat-12ab34cd --field fld-12ab34cd=\"desk/core\" --as usr-12ab34cd"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "List tickets",
        after_help = "EXAMPLES:\n    # All tickets, newest first\n    dk list\n\n    # Only open work\n    dk list --status open --status in_progress\n\n    # Emit machine-readable output\n    dk list --json"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one ticket with its audit trail",
        after_help = "EXAMPLES:\n    # Full detail, custom fields, and history\n    dk show tk-12ab34cd\n\n    # Emit machine-readable output\n    dk show tk-12ab34cd --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a ticket to a new status",
        long_about = "Move a ticket through its lifecycle. The acting role must be allowed \
                      to make the transition, and --version must match the stored version \
                      or the change is rejected as a conflict.",
        after_help = "EXAMPLES:\n    # Start work on a ticket\n    dk status tk-12ab34cd in_progress --version 1 --as usr-agent001\n\n    # Resolve it later\n    dk status tk-12ab34cd resolved --version 2 --as usr-agent001"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Comment on a ticket",
        after_help = "EXAMPLES:\n    # Append a note to the trail\n    dk comment tk-12ab34cd \"Looks related to the LDAP sync.\" --as usr-agent001"
    )]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Delete tickets (administrative)",
        long_about = "Administrative bulk delete. Bypasses the lifecycle: no permission \
                      check, no version check, and no terminating history entry.",
        after_help = "EXAMPLES:\n    dk delete tk-12ab34cd tk-56ef78gh --force"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Read",
        about = "Print dashboard KPIs",
        after_help = "EXAMPLES:\n    # Open count, recent volume, SLA compliance\n    dk kpis\n\n    # Widen the recent-volume window\n    dk kpis --window-days 30"
    )]
    Kpis(cmd::kpis::KpisArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DESK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "desk=debug,info"
        } else {
            "desk=info,warn"
        })
    });

    let format = env::var("DESK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, output, &cli.store),
        Commands::Create(ref args) => {
            cmd::create::run_create(args, output, &cli.store, cli.actor_flag())
        }
        Commands::List(ref args) => cmd::list::run_list(args, output, &cli.store),
        Commands::Show(ref args) => cmd::show::run_show(args, output, &cli.store),
        Commands::Status(ref args) => {
            cmd::status::run_status(args, output, &cli.store, cli.actor_flag())
        }
        Commands::Comment(ref args) => {
            cmd::comment::run_comment(args, output, &cli.store, cli.actor_flag())
        }
        Commands::Delete(ref args) => cmd::delete::run_delete(args, output, &cli.store),
        Commands::Kpis(ref args) => cmd::kpis::run_kpis(args, output, &cli.store),
    }
}
