//! Configuration system for the pame admin client.
//!
//! Provides TOML-based configuration with:
//! - An `[api]` section (server base URL, request and refresh timeouts,
//!   auth exclusion pattern)
//! - A `[storage]` section (where credentials are persisted)
//! - Config file layering (user config + project-local `pame.toml`)
//! - Environment overrides (`PAME_API_BASE_URL`, `PAME_CONFIG_DIR`)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, Layer, LoadedConfig, config_dir, load_config, load_config_with_options,
    read_config, user_config_path, write_config,
};
pub use error::{ConfigError, Result};
pub use types::*;
