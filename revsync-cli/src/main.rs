//! revsync CLI.

mod commands;
mod config;
mod handlers;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{channel, watch};

/// Chat client for the terminal: history, sending and a live channel view
#[derive(Parser)]
#[command(name = "revsync")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "plain")]
    format: output::OutputFormat,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage authentication
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Channel operations
    #[command(alias = "c")]
    Channel {
        #[command(subcommand)]
        action: channel::ChannelAction,
    },

    /// Open a channel and keep it in sync with frames read from stdin
    #[command(alias = "w")]
    Watch {
        /// Channel ID
        channel: String,
        /// Server the channel belongs to, for member lookups
        #[arg(short, long)]
        server: Option<String>,
        /// Messages shown per redraw
        #[arg(short, long, default_value = "20")]
        tail: usize,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum AuthAction {
    /// Store a session token
    Login {
        /// Session token
        #[arg(short, long, env = "REVSYNC_TOKEN")]
        token: String,
        /// Own user ID
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show current auth status
    Status,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "revsync=debug,info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Auth { action } => handle_auth(action),
        Commands::Channel { action } => channel::handle(action, cli.format, cli.verbose).await,
        Commands::Watch {
            channel,
            server,
            tail,
        } => watch::run(&channel, server.as_deref(), tail, cli.format).await,
        Commands::Config => {
            let cfg = config::load_config()?;
            println!("Config file: {}", config::config_path()?.display());
            println!("Authenticated: {}", cfg.auth.is_some());
            if let Some(uid) = cfg.auth.as_ref().and_then(|a| a.user_id.as_ref()) {
                println!("User ID: {}", uid);
            }
            println!(
                "API: {}",
                cfg.api.base_url.as_deref().unwrap_or(revsync::client::DEFAULT_BASE_URL)
            );
            println!(
                "Files: {}",
                cfg.api.files_url.as_deref().unwrap_or(revsync::client::DEFAULT_FILES_URL)
            );
            Ok(())
        }
    }
}

fn handle_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::Login { token, user } => {
            let mut cfg = config::load_config()?;
            cfg.auth = Some(config::AuthConfig {
                token,
                user_id: user.clone(),
            });
            config::save_config(&cfg)?;
            match user {
                Some(uid) => println!("{} {}", "Logged in as".green(), uid),
                None => println!("{}", "Session stored".green()),
            }
            Ok(())
        }
        AuthAction::Logout => {
            let mut cfg = config::load_config()?;
            cfg.auth = None;
            config::save_config(&cfg)?;
            println!("Logged out");
            Ok(())
        }
        AuthAction::Status => {
            let cfg = config::load_config()?;
            match &cfg.auth {
                Some(auth) => println!(
                    "Logged in{}",
                    auth.user_id
                        .as_ref()
                        .map(|uid| format!(" as {}", uid))
                        .unwrap_or_default()
                ),
                None => println!("Not logged in"),
            }
            Ok(())
        }
    }
}
