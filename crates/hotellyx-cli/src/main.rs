#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use output::{OutputMode, resolve_output_mode};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "hotellyx: guest requests and live operations for small hotels",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format. Overrides --json, HOTELLYX_FORMAT, and the user config.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Record store to use instead of `.hotellyx/hotellyx.db`.
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self, user_pref: Option<&str>) -> OutputMode {
        resolve_output_mode(self.format, self.json, user_pref)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize a property",
        long_about = "Write `.hotellyx/config.toml` and create the record store with the default service catalog.",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    hx init\n\n    # Reset the config to defaults\n    hx init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Manage rooms and guest links",
        long_about = "Register rooms, rotate their guest link tokens, and read or set the guest-set room status.",
        after_help = "EXAMPLES:\n    # Register a room\n    hx room add 305\n\n    # Retire a leaked link\n    hx room regen 305\n\n    # Mark do-not-disturb\n    hx room status 305 --set dnd"
    )]
    Room(cmd::room::RoomArgs),

    #[command(
        next_help_heading = "Requests",
        about = "Create and work guest requests",
        long_about = "Create guest requests, browse the staff queue, and move requests through new, accepted, in progress, and done.",
        after_help = "EXAMPLES:\n    # A guest asks for towels\n    hx request create 305 towels --note \"Two bath towels\"\n\n    # Staff queue, oldest first\n    hx request list --tab sla_risk\n\n    # Move a request to its next step\n    hx request advance 4f1c...\n\n    # Emit machine-readable output\n    hx request show 4f1c... --json"
    )]
    Request(cmd::request::RequestArgs),

    #[command(
        next_help_heading = "Requests",
        about = "Manage the service catalog",
        long_about = "List, edit, and toggle bookable services, and book a service slot for a room.",
        after_help = "EXAMPLES:\n    # Guest-facing catalog\n    hx service list\n\n    # Book a spa slot\n    hx service book svc_spa_massage --room 305 --slot 2026-02-07T13:00:00.000Z\n\n    # Hide a service from guests\n    hx service toggle svc_airport_taxi"
    )]
    Service(cmd::service::ServiceArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show the live overview",
        long_about = "Show active requests, SLA risk, response and completion times, and request rate with trends.",
        after_help = "EXAMPLES:\n    # Overview right now\n    hx dashboard\n\n    # Overview at a past instant\n    hx dashboard --at 2026-02-07T12:00:00Z --json"
    )]
    Dashboard(cmd::dashboard::DashboardArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Show request and service analytics",
        long_about = "Show the most requested types, per-service view conversion, and services nobody looks at.",
        after_help = "EXAMPLES:\n    # Full report\n    hx analytics\n\n    # Treat fewer than 10 views as unused\n    hx analytics --unused-below 10"
    )]
    Analytics(cmd::analytics::AnalyticsArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    # Bash\n    hx completions bash > ~/.local/share/bash-completion/completions/hx"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("HOTELLYX_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "hotellyx=debug,info"
        } else {
            "hotellyx=info,warn"
        })
    });

    let format = env::var("HOTELLYX_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

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
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = hotellyx_core::config::load_user_config().unwrap_or_else(|err| {
        warn!("ignoring unreadable user config: {err:#}");
        hotellyx_core::config::UserConfig::default()
    });
    let output = cli.output_mode(user_config.output.as_deref());
    let store = cli.store.as_deref();
    let project_root = env::current_dir()?;

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, store, output, &project_root),
        Commands::Room(args) => cmd::room::run_room(args, store, output, &project_root),
        Commands::Request(args) => {
            cmd::request::run_request(args, store, output, &project_root)
        }
        Commands::Service(args) => {
            cmd::service::run_service(args, store, output, &project_root)
        }
        Commands::Dashboard(args) => {
            cmd::dashboard::run_dashboard(args, store, output, &project_root)
        }
        Commands::Analytics(args) => {
            cmd::analytics::run_analytics(args, store, output, &project_root)
        }
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}
