//! statusbot - IRC status announcement relay
//!
//! # Usage
//!
//! ```bash
//! # Connect and relay commands (default)
//! statusbot
//! statusbot run --config config/statusbot.toml
//!
//! # Validate the configuration and list the enabled publishers
//! statusbot check --config config/statusbot.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use statusbot::bot;
use statusbot::config::{Settings, load_config};
use statusbot::utils::error::BotError;
use statusbot::utils::logging;

#[derive(Parser, Debug)]
#[command(name = "statusbot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the IRC server and relay commands
    Run,

    /// Load and validate the configuration, then exit
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match logging::bootstrap(|| load_config(cli.config.as_deref())) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("statusbot: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&settings.logging.level);

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => bot::run(settings).await,
        Command::Check => check(&settings),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Reports what `run` would use without touching any publisher.
fn check(settings: &Settings) -> Result<(), BotError> {
    info!(
        "Configuration OK: {}:{} as {} in {}",
        settings.irc.server,
        settings.irc.port,
        settings.irc.nick,
        settings.irc.channels.join(", ")
    );
    info!("Trusted nicks: {}", settings.irc.nicks.join(", "));

    let publishers: Vec<&str> = [
        settings.wiki.as_ref().map(|_| "wiki"),
        settings.alertfile.as_ref().map(|_| "alertfile"),
        settings.microblog.as_ref().map(|_| "microblog"),
    ]
    .into_iter()
    .flatten()
    .collect();
    if publishers.is_empty() {
        info!("Publishers: none (null publisher)");
    } else {
        info!("Publishers: {}", publishers.join(", "));
    }
    if let Some(journal) = &settings.journal {
        info!("Journal: {}", journal.path);
    }
    Ok(())
}
