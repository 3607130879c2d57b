//! Auth command - session management.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};
use pame_client::DEFAULT_ROLE;
use serde::Serialize;

use super::{Context, prompt_line, prompt_secret};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in with email and password
    Login {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted without echo if omitted)
        #[arg(short, long, env = "PAME_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a new account
    Register {
        /// Account email (prompted if omitted)
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted without echo if omitted)
        #[arg(short, long, env = "PAME_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Role assigned to the account
        #[arg(long, default_value = DEFAULT_ROLE)]
        role: String,
    },

    /// Sign out and clear stored credentials
    Logout,

    /// Show the current session
    Status,

    /// Exchange the stored refresh token for a new access token
    Refresh,
}

/// Session status for JSON output.
#[derive(Debug, Serialize)]
struct StatusOutput {
    signed_in: bool,
    user: Option<String>,
    has_refresh_token: bool,
    server_url: String,
    credentials_path: String,
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { email, password } => cmd_login(email, password, ctx).await,
        AuthCommand::Register {
            email,
            password,
            role,
        } => cmd_register(email, password, role, ctx).await,
        AuthCommand::Logout => cmd_logout(ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Refresh => cmd_refresh(ctx).await,
    }
}

async fn cmd_login(email: Option<String>, password: Option<String>, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;

    if let Some(user) = conn.session.user()
        && conn.session.is_signed_in()
    {
        if ctx.json_output {
            ctx.print_json(&serde_json::json!({ "signed_in": true, "user": user.email }))?;
        } else {
            println!("Already signed in as {}", style(&user.email).cyan());
            println!("Run 'pame auth logout' first to switch accounts.");
        }
        return Ok(());
    }

    let email = prompt_line("Email", email)?;
    let password = prompt_secret("Password", password)?;

    let user = conn
        .session
        .sign_in(&conn.client, &email, &password)
        .await
        .context("Sign in failed")?;

    if ctx.json_output {
        ctx.print_json(&serde_json::json!({ "signed_in": true, "user": user.email }))?;
    } else {
        println!("Signed in as {}", style(&user.email).cyan());
    }
    Ok(())
}

async fn cmd_register(
    email: Option<String>,
    password: Option<String>,
    role: String,
    ctx: &Context,
) -> Result<()> {
    let conn = ctx.connect().await?;

    let email = prompt_line("Email", email)?;
    let password = prompt_secret("Password", password)?;

    let body = conn
        .session
        .register(&conn.client, &email, &password, &role)
        .await
        .context("Registration failed")?;

    if ctx.json_output {
        ctx.print_json(&body)?;
    } else {
        println!("Registered {}", style(&email).cyan());
        println!("Run 'pame auth login' to sign in.");
    }
    Ok(())
}

async fn cmd_logout(ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let was_signed_in = conn.session.is_signed_in();

    conn.session.sign_out(&conn.client).await;

    if ctx.json_output {
        ctx.print_json(&serde_json::json!({ "signed_out": was_signed_in }))?;
    } else if was_signed_in {
        println!("Signed out. Stored credentials removed.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let session = conn.session.snapshot();

    let output = StatusOutput {
        signed_in: session.is_signed_in(),
        user: session.user_email.clone(),
        has_refresh_token: session.refresh_token.is_some(),
        server_url: conn.client.base_url().to_string(),
        credentials_path: conn.store.path().display().to_string(),
    };

    if ctx.json_output {
        return ctx.print_json(&output);
    }

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    println!();
    println!("{}", style("Session Status").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    if output.signed_in {
        println!("  {} {}", dim.apply_to("Status:"), green.apply_to("● signed in"));
    } else {
        println!("  {} {}", dim.apply_to("Status:"), red.apply_to("● signed out"));
    }
    if let Some(user) = &output.user {
        println!("  {} {}", dim.apply_to("User:"), user);
    }
    println!(
        "  {} {}",
        dim.apply_to("Refresh:"),
        if output.has_refresh_token { "stored" } else { "none" }
    );
    println!("  {} {}", dim.apply_to("Server:"), output.server_url);

    if ctx.verbose {
        println!("  {} {}", dim.apply_to("Store:"), output.credentials_path);
    }

    if !output.signed_in {
        println!();
        println!("  {}", dim.apply_to("Sign in with: pame auth login"));
    }
    println!();
    Ok(())
}

async fn cmd_refresh(ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;

    let token = conn
        .session
        .refresh_access_token(&conn.client)
        .await
        .context("Token refresh failed")?;

    let refreshed = token.is_some();
    if ctx.json_output {
        ctx.print_json(&serde_json::json!({ "refreshed": refreshed }))?;
    } else if refreshed {
        println!("Access token refreshed.");
    } else {
        println!("No new access token issued. Run 'pame auth login'.");
    }
    Ok(())
}
