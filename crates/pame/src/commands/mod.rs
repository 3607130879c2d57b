//! CLI command handlers.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use pame_client::{AuthOptions, FileCredentialStore, PameClient, PathMatcher, SessionManager};
use pame_config::{LoadedConfig, PameConfig};
use serde::Serialize;

pub mod auth;
pub mod config;
pub mod password;
pub mod users;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server URL override from `--server` or `PAME_API_BASE_URL`.
    pub server_url: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// A configured client with the persisted session attached.
pub struct Connection {
    pub client: PameClient,
    pub session: Arc<SessionManager>,
    pub store: Arc<FileCredentialStore>,
}

impl Context {
    /// Discover and merge config files from the user and project directories.
    pub fn load_config(&self) -> Result<LoadedConfig> {
        let cwd = std::env::current_dir().ok();
        pame_config::load_config(cwd.as_deref()).context("Failed to load configuration")
    }

    /// Base URL after applying the command-line override.
    pub fn base_url(&self, config: &PameConfig) -> String {
        self.server_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| config.effective_base_url())
    }

    /// Build the client, load the stored session and attach it as auth hooks.
    pub async fn connect(&self) -> Result<Connection> {
        let config = self.load_config()?.config;
        let api = config.api();

        let base_url = self.base_url(&config);
        let client = PameClient::builder()
            .base_url(&base_url)
            .timeout(api.timeout()?)
            .build()
            .with_context(|| format!("Invalid server URL: {}", base_url))?;

        let config_dir = pame_config::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        let store = Arc::new(FileCredentialStore::with_path(
            config.credentials_path(&config_dir),
        ));
        let session = Arc::new(SessionManager::new(store.clone()));
        session.load().await;

        let mut options = AuthOptions::default().with_refresh_timeout(api.refresh_timeout());
        if let Some(pattern) = api.exclude_paths.as_deref() {
            options = options.with_exclude_paths(PathMatcher::new(pattern)?);
        }
        client.attach_auth(session.clone(), options);

        tracing::debug!(server = %base_url, signed_in = session.is_signed_in(), "client ready");

        Ok(Connection {
            client,
            session,
            store,
        })
    }

    /// Print `value` as pretty JSON.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Use `given` or ask for a line on stdin.
pub fn prompt_line(label: &str, given: Option<String>) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }

    print!("{}: ", label);
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();
    if input.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(input)
}

/// Use `given` or ask for a hidden value on the terminal.
pub fn prompt_secret(label: &str, given: Option<String>) -> Result<String> {
    if let Some(value) = given {
        return Ok(value);
    }

    let value = rpassword::prompt_password(format!("{}: ", label))?;
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}
