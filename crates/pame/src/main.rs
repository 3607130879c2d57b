//! pame - command-line admin client
//!
//! Main entry point for the pame CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, config, password, users};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// pame - command-line admin client
#[derive(Parser)]
#[command(name = "pame")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL (default: from config, then http://127.0.0.1:4000)
    #[arg(long, global = true, env = "PAME_API_BASE_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, sign out and inspect the session
    Auth(auth::AuthArgs),

    /// Reset a forgotten password
    Password(password::PasswordArgs),

    /// Manage user accounts
    Users(users::UsersArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "pame=debug,pame_client=debug,pame_config=debug,info"
    } else {
        "pame=info,pame_client=info,warn"
    };

    let log_dir = pame_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "pame.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "pame=trace,pame_client=trace,pame_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        server_url: cli.server,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Password(args) => password::run(args, &ctx).await,
        Commands::Users(args) => users::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
