pub mod account;
pub mod interactive;
pub mod shutdown;
pub mod stats;

use std::path::PathBuf;

use account::{process_account_command, process_login_command};
use anyhow::Result;
use clap::{Parser, Subcommand};
use interactive::{run_interactive, RunCommand};
use stats::{process_sessions_command, process_stats_command, SessionsCommand, StatsCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    config::IdentityArgs,
    utils::{dir::resolve_application_path, logging::enable_logging},
};

#[derive(Parser, Debug)]
#[command(name = "Stint", version, long_about = None)]
#[command(about = "Focus timer that keeps your sessions and sums them up", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Option<Commands>,
    #[arg(long, global = true, help = "Print logs to the console as well")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME/stint or $HOME/.local/state/stint"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Open the interactive timer. This is the default command")]
    Run {
        #[command(flatten)]
        command: RunCommand,
    },
    #[command(about = "Show daily, weekly, monthly and yearly totals")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "List the most recent saved sessions")]
    Sessions {
        #[command(flatten)]
        command: SessionsCommand,
    },
    #[command(about = "Print the URL to sign in with the identity provider")]
    Login {
        #[command(flatten)]
        identity: IdentityArgs,
    },
    #[command(about = "Show the account from a sign-in redirect")]
    Account {
        #[arg(long, help = "Redirect URL or fragment returned by the identity provider")]
        response: String,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = resolve_application_path(args.dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(&app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        None => run_interactive(app_dir, args.log, RunCommand::default()).await,
        Some(Commands::Run { command }) => run_interactive(app_dir, args.log, command).await,
        Some(Commands::Stats { command }) => process_stats_command(&app_dir, command).await,
        Some(Commands::Sessions { command }) => process_sessions_command(&app_dir, command).await,
        Some(Commands::Login { identity }) => process_login_command(identity),
        Some(Commands::Account { response }) => process_account_command(&response),
    }
}
