//! Configuration file loading for sinopia.
//!
//! Reads `sinopia.config.json` from the current working directory, or the
//! file given with `--config`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sinopia_armature::ParserOptions;
use sinopia_atelier::{DirectiveSet, DirectiveSetError};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "sinopia.config.json";

/// Top-level sinopia configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinopiaConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Directive kinds in compile order. Managing kinds (`each`) go first.
    pub directives: Vec<String>,

    /// Keep markup comments as markers.
    pub comments: bool,

    /// Upper bound on ticks flushed before output is printed.
    pub max_ticks: usize,
}

impl Default for SinopiaConfig {
    fn default() -> Self {
        Self {
            schema: None,
            directives: DirectiveSet::KNOWN.iter().map(|name| name.to_string()).collect(),
            comments: true,
            max_ticks: 64,
        }
    }
}

impl SinopiaConfig {
    pub fn directive_set(&self) -> Result<DirectiveSet, ConfigError> {
        Ok(DirectiveSet::from_names(self.directives.as_slice())?)
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            comments: self.comments,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Directives(#[from] DirectiveSetError),
}

/// Read the configuration at `path`, or `sinopia.config.json` in the working
/// directory. A missing default file yields the defaults.
pub fn try_load_config(path: Option<&Path>) -> Result<SinopiaConfig, ConfigError> {
    let (config_path, explicit) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (
            std::env::current_dir().unwrap_or_default().join(CONFIG_FILE_NAME),
            false,
        ),
    };

    if !explicit && !config_path.exists() {
        return Ok(SinopiaConfig::default());
    }

    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    let config: SinopiaConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path,
            source,
        })?;
    config.directive_set()?;
    Ok(config)
}

/// Like [`try_load_config`], but problems are reported as warnings and the
/// defaults are used.
pub fn load_config(path: Option<&Path>) -> SinopiaConfig {
    match try_load_config(path) {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, "using default configuration");
            SinopiaConfig::default()
        }
    }
}
