//! Native load-order file reading (ModsConfig.xml)
//!
//! The game stores the active mod list and its own version in one XML
//! file. It goes through the same lenient document pipeline as mod
//! descriptors, but unlike a descriptor this file belongs to the game:
//! if it cannot be parsed the whole operation fails, there is no
//! per-item recovery. Writing the file back is the host's concern; the
//! engine only supplies the ordered id sequence and the resolved version.

use crate::mods::about::{self, document, normalize, DocumentOptions};
use crate::mods::VersionKey;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Root element of ModsConfig.xml.
const CONFIG_ROOT_TAG: &str = "ModsConfigData";

/// The game version as written by the game itself, e.g. `1.3.3200 rev726`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameVersion {
    /// The `major.minor` part, the key all by-version maps use.
    pub key: VersionKey,
    /// Build number, the third dotted component.
    pub build: Option<u32>,
    /// Trailing revision label, e.g. `rev726`.
    pub rev: Option<String>,
    /// The unmodified version string.
    pub full: String,
}

impl GameVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut words = raw.split_whitespace();
        let dotted = words.next()?;

        let mut parts = dotted.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
        let build = parts.next().and_then(|b| b.parse().ok());

        Some(Self {
            key: VersionKey::new(major, minor),
            build,
            rev: words.next().map(str::to_string),
            full: raw.to_string(),
        })
    }
}

/// Parsed contents of the game's ModsConfig.xml.
#[derive(Debug, Clone)]
pub struct ModsConfig {
    pub version: Option<GameVersion>,
    /// Active PackageIds in load order.
    pub active_mods: Vec<String>,
    pub known_expansions: Vec<String>,
}

/// Read and parse the game's ModsConfig.xml.
pub fn read_mods_config(path: &Path) -> Result<ModsConfig> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read mods config: {}", path.display()))?;
    parse_mods_config(&about::decode_descriptor_bytes(&bytes))
}

pub fn parse_mods_config(text: &str) -> Result<ModsConfig> {
    let tree = document::parse_document(text, &DocumentOptions::default())
        .context("ModsConfig.xml has invalid XML content")?;
    let tree = normalize::collapse_list_wrappers(tree);

    let data = tree
        .as_map()
        .and_then(|root| root.get(CONFIG_ROOT_TAG))
        .and_then(|v| v.as_map())
        .ok_or_else(|| anyhow!("ModsConfig.xml has no <{}> root element", CONFIG_ROOT_TAG))?;

    let version = data
        .get("version")
        .and_then(|v| v.as_text())
        .and_then(|s| GameVersion::parse(&s));
    if version.is_none() {
        tracing::warn!("ModsConfig.xml carries no parseable version");
    }

    Ok(ModsConfig {
        version,
        active_mods: id_list(data.get("activeMods")),
        known_expansions: id_list(data.get("knownExpansions")),
    })
}

fn id_list(value: Option<&document::DocValue>) -> Vec<String> {
    normalize::into_list(value.cloned())
        .iter()
        .filter(|v| !v.is_falsy())
        .filter_map(|v| v.as_text())
        .collect()
}
