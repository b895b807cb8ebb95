//! Reading `docrev.toml` and finding which one applies.

use crate::config::schema::{DocrevConfig, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "DOCREV_CONFIG";
pub const CONFIG_FILE_NAME: &str = "docrev.toml";
const HOME_CONFIG_FILE_NAME: &str = ".docrev.toml";

/// A config that could not be read, parsed or accepted.
///
/// `path` is `None` when the config came from a string rather than a file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not a valid docrev config: {source}", origin(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },
    #[error("{} has settings docrev cannot use:\n{source}", origin(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },
}

impl ConfigError {
    /// File the error refers to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } => Some(path),
            ConfigError::Toml { path, .. } | ConfigError::Validation { path, .. } => {
                path.as_deref()
            }
        }
    }
}

fn origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "inline config".to_string(),
    }
}

/// Parse and validate config text that did not come from a file.
pub fn load_from_str(input: &str) -> Result<DocrevConfig, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<DocrevConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

fn parse(input: &str, file: Option<&Path>) -> Result<DocrevConfig, ConfigError> {
    let path = || file.map(Path::to_path_buf);
    let config: DocrevConfig = toml_edit::de::from_str(input).map_err(|source| {
        ConfigError::Toml {
            path: path(),
            source,
        }
    })?;
    config.validate().map_err(|source| ConfigError::Validation {
        path: path(),
        source,
    })?;
    Ok(config)
}

/// Config file to use: `explicit`, then `$DOCREV_CONFIG`, then
/// `./docrev.toml`, then `~/.docrev.toml`.
///
/// Explicit and environment paths are returned even if they do not exist so
/// that loading reports the problem; the implicit locations are only used
/// when present.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    home::home_dir()
        .map(|home| home.join(HOME_CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

/// Load the located config file, or defaults when there is none.
pub fn load(explicit: Option<&Path>) -> Result<DocrevConfig, ConfigError> {
    match locate(explicit) {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            load_from_path(&path)
        }
        None => {
            log::debug!("no config file found, using defaults");
            Ok(DocrevConfig::default())
        }
    }
}
