//! Users command - admin user management.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::{Style, style};
use pame_client::{DEFAULT_ROLE, NewUser, UserUpdate};

use super::{Context, prompt_secret};

/// Arguments for the users command.
#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Show a user
    Get {
        /// User ID
        id: u64,
    },

    /// Create a user
    Create {
        /// Account email
        email: String,

        /// Initial password (prompted without echo if omitted)
        #[arg(short, long, env = "PAME_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Role assigned to the account
        #[arg(long, default_value = DEFAULT_ROLE)]
        role: String,

        /// Create the account disabled
        #[arg(long)]
        inactive: bool,
    },

    /// Update a user's email, status or password
    Update {
        /// User ID
        id: u64,

        /// New email (defaults to the current one)
        #[arg(long)]
        email: Option<String>,

        /// Enable the account
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Disable the account
        #[arg(long)]
        disable: bool,

        /// Prompt for a new password
        #[arg(long)]
        change_password: bool,
    },
}

/// Run the users command.
pub async fn run(args: UsersArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    if !conn.session.is_signed_in() {
        anyhow::bail!("Not signed in. Run 'pame auth login' first.");
    }
    let users = conn.client.users();

    match args.command {
        UsersCommand::Get { id } => {
            let user = users
                .get(id)
                .await
                .with_context(|| format!("Could not load user {}", id))?;

            if ctx.json_output {
                return ctx.print_json(&user);
            }

            let dim = Style::new().dim();
            println!();
            println!("{}", style(format!("User {}", id)).bold());
            println!("{}", dim.apply_to("─".repeat(40)));
            println!("  {} {}", dim.apply_to("Email:"), user.email);
            println!(
                "  {} {}",
                dim.apply_to("Status:"),
                if user.status {
                    style("active").green()
                } else {
                    style("inactive").red()
                }
            );
            if let Some(role) = &user.role {
                println!("  {} {}", dim.apply_to("Role:"), role);
            }
            println!();
        }
        UsersCommand::Create {
            email,
            password,
            role,
            inactive,
        } => {
            let password = prompt_secret("Password", password)?;
            let body = users
                .create(&NewUser {
                    email: email.clone(),
                    password,
                    status: !inactive,
                    role,
                })
                .await
                .context("Could not create user")?;

            if ctx.json_output {
                ctx.print_json(&body)?;
            } else {
                println!("Created {}", style(&email).cyan());
            }
        }
        UsersCommand::Update {
            id,
            email,
            enable,
            disable,
            change_password,
        } => {
            let current = users
                .get(id)
                .await
                .with_context(|| format!("Could not load user {}", id))?;

            let status = match (enable, disable) {
                (true, _) => true,
                (_, true) => false,
                _ => current.status,
            };
            let password = if change_password {
                Some(prompt_secret("New password", None)?)
            } else {
                None
            };

            let update = UserUpdate {
                email: email.unwrap_or(current.email),
                status,
                password,
            };
            let body = users
                .update(id, &update)
                .await
                .with_context(|| format!("Could not update user {}", id))?;

            if ctx.json_output {
                ctx.print_json(&body)?;
            } else {
                println!("Updated user {}", style(id).cyan());
            }
        }
    }

    Ok(())
}
