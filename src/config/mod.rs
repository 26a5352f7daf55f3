//! Configuration management for rimstack
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/rimstack/config.toml
//! - Logs: ~/.cache/rimstack/
//!
//! The config supplies the engine's inputs - the per-source install roots,
//! the user's per-mod source reclassifications, and the game-version
//! fallback/override - but the engine itself never reads it directly.

mod paths;

pub use paths::Paths;

use crate::mods::{ModSource, PackageId, VersionKey};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-source installation roots and the game's mods config file
    pub file_paths: FilePaths,

    /// Per-PackageId source reclassification, e.g. treating a widely-used
    /// workshop framework as core
    pub mod_source_overrides: HashMap<PackageId, ModSource>,

    /// Game version fallback/override settings
    pub version: VersionSettings,

    /// Paths configuration
    #[serde(skip)]
    pub paths: Paths,
}

impl Default for Config {
    fn default() -> Self {
        let mut mod_source_overrides = HashMap::new();
        // frameworks that effectively behave like core content
        mod_source_overrides.insert("unlimitedhugs.hugslib".to_string(), ModSource::Core);
        mod_source_overrides.insert("brrainz.harmony".to_string(), ModSource::Core);
        mod_source_overrides.insert("erdelf.humanoidalienraces".to_string(), ModSource::Core);

        Self {
            file_paths: FilePaths::default(),
            mod_source_overrides,
            version: VersionSettings::default(),
            paths: Paths::new(),
        }
    }
}

/// Where the game keeps each mod source, plus its ModsConfig.xml.
/// A leading `~` resolves against $HOME when the path is used.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FilePaths {
    pub workshop: String,
    pub local: String,
    pub core: String,
    pub mods_config: String,
}

impl Default for FilePaths {
    fn default() -> Self {
        Self {
            workshop: "~/.steam/steam/steamapps/workshop/content/294100".to_string(),
            local: "~/.steam/steam/steamapps/common/RimWorld/Mods".to_string(),
            core: "~/.steam/steam/steamapps/common/RimWorld/Data".to_string(),
            mods_config: "~/.config/unity3d/Ludeon Studios/RimWorld by Ludeon Studios/Config/ModsConfig.xml"
                .to_string(),
        }
    }
}

/// How to pick the active game version when building a selection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VersionSettings {
    /// Used when the game's own files yield no version.
    pub fallback: VersionKey,
    /// Hard override; wins over whatever the game reports.
    #[serde(rename = "override")]
    pub override_version: Option<VersionKey>,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            fallback: VersionKey::new(1, 3),
            override_version: None,
        }
    }
}

impl Config {
    /// Resolve the install root for a mod source.
    pub fn source_root(&self, source: ModSource) -> PathBuf {
        let raw = match source {
            ModSource::Workshop => &self.file_paths.workshop,
            ModSource::Local => &self.file_paths.local,
            ModSource::Core => &self.file_paths.core,
        };
        expand_home(raw)
    }

    /// Resolve the path of the game's ModsConfig.xml.
    pub fn mods_config_path(&self) -> PathBuf {
        expand_home(&self.file_paths.mods_config)
    }

    /// Pick the active version: override, then what the game reports,
    /// then the configured fallback.
    pub fn resolve_version(&self, native: Option<VersionKey>) -> VersionKey {
        self.version
            .override_version
            .or(native)
            .unwrap_or(self.version.fallback)
    }

    /// Load configuration from disk or create default
    pub fn load() -> Result<Self> {
        let paths = Paths::new();
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.paths = paths;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = self.paths.config_file();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}

fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_source_roots_cover_all_sources() {
        let config = Config::default();
        for &source in ModSource::all() {
            assert!(!config.source_root(source).as_os_str().is_empty());
        }
    }

    #[test]
    fn test_version_resolution_precedence() {
        let mut config = Config::default();
        config.version.fallback = VersionKey::new(1, 2);

        assert_eq!(config.resolve_version(None), VersionKey::new(1, 2));
        assert_eq!(
            config.resolve_version(Some(VersionKey::new(1, 3))),
            VersionKey::new(1, 3)
        );

        config.version.override_version = Some(VersionKey::new(1, 4));
        assert_eq!(
            config.resolve_version(Some(VersionKey::new(1, 3))),
            VersionKey::new(1, 4)
        );
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();

        assert_eq!(parsed.file_paths.workshop, config.file_paths.workshop);
        assert_eq!(parsed.version.fallback, VersionKey::new(1, 3));
        assert_eq!(
            parsed.mod_source_overrides.get("brrainz.harmony"),
            Some(&ModSource::Core)
        );
    }

    #[test]
    fn test_expand_home() {
        if std::env::var_os("HOME").is_some() {
            assert!(!expand_home("~/x").to_string_lossy().starts_with('~'));
        }
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }
}
