//! Password command - forgotten password recovery.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use console::style;

use super::{Context, prompt_line, prompt_secret};

/// Arguments for the password command.
#[derive(Args, Debug)]
pub struct PasswordArgs {
    #[command(subcommand)]
    pub command: PasswordCommand,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// Email a security code to the account
    Forgot {
        /// Account email
        email: String,
    },

    /// Verify the emailed code and print a reset token
    Verify {
        /// Account email
        email: String,

        /// Security code from the email (prompted if omitted)
        code: Option<String>,
    },

    /// Set a new password with a reset token
    Reset {
        /// Account email
        email: String,

        /// Reset token from 'pame password verify'
        reset_token: String,

        /// New password (prompted without echo if omitted)
        #[arg(long, env = "PAME_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

/// Run the password command.
pub async fn run(args: PasswordArgs, ctx: &Context) -> Result<()> {
    let conn = ctx.connect().await?;
    let api = conn.client.password();

    match args.command {
        PasswordCommand::Forgot { email } => {
            api.request_reset(&email)
                .await
                .context("Could not request a security code")?;
            if ctx.json_output {
                ctx.print_json(&serde_json::json!({ "sent": true, "email": email }))?;
            } else {
                println!("Security code sent to {}", style(&email).cyan());
                println!("Continue with: pame password verify {} <code>", email);
            }
        }
        PasswordCommand::Verify { email, code } => {
            let code = prompt_line("Code", code)?;
            let reset_token = api
                .verify_code(&email, &code)
                .await
                .context("Code verification failed")?;
            if ctx.json_output {
                ctx.print_json(&serde_json::json!({ "reset_token": reset_token }))?;
            } else {
                println!("Code verified.");
                println!("Continue with: pame password reset {} {}", email, reset_token);
            }
        }
        PasswordCommand::Reset {
            email,
            reset_token,
            new_password,
        } => {
            let new_password = prompt_secret("New password", new_password)?;
            api.reset(&email, &reset_token, &new_password)
                .await
                .context("Password reset failed")?;
            if ctx.json_output {
                ctx.print_json(&serde_json::json!({ "reset": true }))?;
            } else {
                println!("Password updated. Sign in with: pame auth login");
            }
        }
    }

    Ok(())
}
