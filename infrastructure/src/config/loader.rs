//! Configuration file loader with multi-source merging

use super::ConfigError;
use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. Project root: `./foresight.toml` or `./.foresight.toml`
    /// 3. Global: `~/.config/foresight/config.toml`
    /// 4. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!(path = %global_path.display(), "merging global config");
            figment = figment.merge(Toml::file(&global_path));
        }

        if let Some(path) = Self::project_config_path() {
            debug!(path = %path.display(), "merging project config");
            figment = figment.merge(Toml::file(&path));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Only the built-in defaults (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Global config file path under the user's config directory
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("foresight").join("config.toml"))
    }

    /// Project-level config file, if one exists
    pub fn project_config_path() -> Option<PathBuf> {
        ["foresight.toml", ".foresight.toml"]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}
