//! Optional user configuration
//!
//! Read from `$INKDIFF_CONFIG`, or `<config dir>/inkdiff/config.toml`:
//!
//! ```toml
//! matcher = "blocks"   # blocks | myers | patience | lcs
//!
//! [colors]
//! deleted = "red"
//! inserted = "blue"
//! ```

use inkdiff_core::{Matcher, Palette, PaletteColor};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_ENV: &str = "INKDIFF_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub matcher: Matcher,
    pub colors: ColorsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorsConfig {
    pub deleted: PaletteColor,
    pub inserted: PaletteColor,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        let palette = Palette::default();
        Self {
            deleted: palette.deleted,
            inserted: palette.inserted,
        }
    }
}

impl Config {
    /// Where the config is looked up, if anywhere
    pub fn path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => dirs::config_dir().map(|dir| dir.join("inkdiff").join("config.toml")),
        }
    }

    /// Load the user config, falling back to defaults when there is none
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn palette(&self) -> Palette {
        Palette::new(self.colors.deleted, self.colors.inserted)
    }
}
