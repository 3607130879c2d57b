//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::{Style, style};

use pame_config::{ApiConfig, PameConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Initialize a config file with defaults
    Init {
        /// Create project-local config (./pame.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Base URL to write into the new file
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Init { local, base_url } => cmd_init(local, base_url),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = &loaded.config;
    let api = config.api();

    let base_url = ctx.base_url(config);
    let refresh_timeout = api
        .refresh_timeout()
        .map(|d| format!("{}s", d.as_secs()))
        .unwrap_or_else(|| "disabled".to_string());
    let credentials = pame_config::config_dir()
        .map(|dir| config.credentials_path(&dir).display().to_string());

    if ctx.json_output {
        return ctx.print_json(&serde_json::json!({
            "base_url": base_url,
            "timeout_secs": api.timeout_secs(),
            "refresh_timeout_secs": api.refresh_timeout_secs(),
            "exclude_paths": api.exclude_paths,
            "credentials_path": credentials,
            "sources": loaded.loaded_from(),
        }));
    }

    let dim = Style::new().dim();

    println!("{}", style("pame Configuration").bold());
    println!("{}", dim.apply_to("─".repeat(40)));

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("  {} {}", dim.apply_to("Base URL:"), base_url);
    println!("  {} {}s", dim.apply_to("Timeout:"), api.timeout_secs());
    println!("  {} {}", dim.apply_to("Refresh timeout:"), refresh_timeout);
    println!(
        "  {} {}",
        dim.apply_to("Auth exclusions:"),
        api.exclude_paths.as_deref().unwrap_or("(built-in)")
    );
    if let Some(path) = credentials {
        println!("  {} {}", dim.apply_to("Credentials:"), path);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    if ctx.json_output {
        let sources: Vec<_> = loaded
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        return ctx.print_json(&sources);
    }

    println!("Config files (lowest precedence first):");
    for source in &loaded.sources {
        let marker = if source.loaded {
            style("✓").green()
        } else {
            style("·").dim()
        };
        println!("  {} {}", marker, source.path.display());
    }
    Ok(())
}

fn cmd_init(local: bool, base_url: Option<String>) -> Result<()> {
    let path = if local {
        std::path::PathBuf::from("pame.toml")
    } else {
        pame_config::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
    };

    if path.exists() {
        println!("Config file already exists: {}", path.display());
        return Ok(());
    }

    let config = PameConfig {
        api: Some(ApiConfig {
            base_url: Some(base_url.unwrap_or_else(|| pame_config::DEFAULT_BASE_URL.to_string())),
            ..ApiConfig::with_defaults()
        }),
        storage: None,
    };
    pame_config::write_config(&config, &path)?;

    println!("✓ Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  pame config show    # verify configuration");
    println!("  pame auth login     # sign in");
    Ok(())
}

fn cmd_path() -> Result<()> {
    match pame_config::user_config_path() {
        Some(path) => println!("{}", path.display()),
        None => anyhow::bail!("Could not determine config directory"),
    }
    Ok(())
}
