//! Locating, reading and writing config files.
//!
//! Two file layers are stacked, the later one winning field by field:
//!
//! | Layer | File |
//! |---|---|
//! | [`Layer::User`] | `<config dir>/config.toml` |
//! | [`Layer::Project`] | `pame.toml` in the project directory |
//!
//! The config dir is `$PAME_CONFIG_DIR` when set, otherwise `pame/` under the
//! platform config directory. Environment variables and command-line flags
//! sit above both files and are applied by the accessors and the CLI.

use std::path::{Path, PathBuf};

use crate::{ConfigError, PameConfig, Result};

const USER_FILE_NAME: &str = "config.toml";
const PROJECT_FILE_NAME: &str = "pame.toml";
const CONFIG_DIR_ENV: &str = "PAME_CONFIG_DIR";

/// A config file layer, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    User,
    Project,
}

impl Layer {
    fn file_name(self) -> &'static str {
        match self {
            Layer::User => USER_FILE_NAME,
            Layer::Project => PROJECT_FILE_NAME,
        }
    }
}

/// One layer that was looked for during discovery.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub layer: Layer,
    pub path: PathBuf,
    /// `false` when no file existed at `path`.
    pub loaded: bool,
}

/// The merged config plus every layer that was considered.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PameConfig,
    pub sources: Vec<ConfigSource>,
}

impl LoadedConfig {
    /// Files that actually contributed, lowest precedence first.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter_map(|s| s.loaded.then_some(s.path.as_path()))
            .collect()
    }
}

/// Directory holding the user config file, credentials and logs.
pub fn config_dir() -> Option<PathBuf> {
    match std::env::var(CONFIG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|base| base.join("pame")),
    }
}

/// Path of the user-level config file.
pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(Layer::User.file_name()))
}

/// Discover and merge config, using the default config dir.
///
/// `project_dir` defaults to the process working directory.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], with the user config dir pinned to `user_dir`.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_path = match user_dir {
        Some(dir) => Some(dir.join(Layer::User.file_name())),
        None => user_config_path(),
    };
    let project_path = project_dir
        .unwrap_or(Path::new("."))
        .join(Layer::Project.file_name());

    let candidates = user_path
        .map(|path| (Layer::User, path))
        .into_iter()
        .chain(std::iter::once((Layer::Project, project_path)));

    let mut loaded = LoadedConfig {
        config: PameConfig::new(),
        sources: Vec::new(),
    };
    for (layer, path) in candidates {
        let found = path.is_file();
        if found {
            loaded.config.merge(read_config(&path)?);
        }
        loaded.sources.push(ConfigSource {
            layer,
            path,
            loaded: found,
        });
    }

    Ok(loaded)
}

/// Parse a single config file.
pub fn read_config(path: &Path) -> Result<PameConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    PameConfig::from_toml(&text)
}

/// Write `config` as TOML to `path`; missing parent directories are created.
pub fn write_config(config: &PameConfig, path: &Path) -> Result<()> {
    let write_error = |target: &Path, source| ConfigError::WriteFile {
        path: target.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_error(path, e))
}
