//! Mod data model - the canonical normalized entity produced by scanning

pub mod about;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Case-insensitive mod identifier. Lookups always go through the
/// lowercased form; the stored value keeps its original casing for display.
pub type PackageId = String;

/// Lowercase a package id for use as a map/selection key.
pub fn normalize_id(id: &str) -> String {
    id.to_lowercase()
}

/// Where a mod was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModSource {
    /// Steam Workshop subscription folder
    Workshop,
    /// Manually installed under the game's Mods folder
    Local,
    /// Base game and official expansions (Data folder)
    Core,
}

impl ModSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModSource::Workshop => "workshop",
            ModSource::Local => "local",
            ModSource::Core => "core",
        }
    }

    pub fn from_cli(value: &str) -> anyhow::Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "workshop" => Ok(ModSource::Workshop),
            "local" => Ok(ModSource::Local),
            "core" => Ok(ModSource::Core),
            other => anyhow::bail!(
                "Invalid mod source '{}'. Valid values: workshop, local, core",
                other
            ),
        }
    }

    pub fn all() -> &'static [ModSource] {
        &[ModSource::Workshop, ModSource::Local, ModSource::Core]
    }
}

impl fmt::Display for ModSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to another mod, not necessarily present in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModDependency {
    pub package_id: PackageId,
    pub display_name: String,
    pub steam_workshop_url: Option<String>,
    pub download_url: Option<String>,
}

/// Game version in `major.minor` form, parsed from `v<major>.<minor>`
/// descriptor map keys (e.g. `v1.3`). Used as the key of all by-version
/// maps so the tag-vs-number ambiguity is resolved once, at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionKey {
    pub major: u16,
    pub minor: u16,
}

impl VersionKey {
    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Parse a `v<digits>.<digits>` map key, e.g. `v1.3`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let rest = tag.strip_prefix('v')?;
        Self::from_dotted(rest)
    }

    /// Parse a bare `<digits>.<digits>` string, e.g. `1.3`. A missing
    /// minor component is treated as zero (`"1"` parses as 1.0).
    pub fn from_dotted(value: &str) -> Option<Self> {
        let mut parts = value.splitn(2, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(m) => m.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }

    /// Parse the numeric form a descriptor leaf coerces to (e.g. `1.3`).
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Self::from_dotted(&value.to_string())
    }

    /// Numeric form, e.g. `1.3`. Round-trips with [`VersionKey::from_f64`].
    pub fn as_f64(&self) -> f64 {
        format!("{}.{}", self.major, self.minor)
            .parse()
            .unwrap_or(self.major as f64)
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// By-version maps serialize with the dotted form as the key so JSON
// output reads the way game versions are written elsewhere.
impl Serialize for VersionKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for VersionKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        VersionKey::from_dotted(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid version key '{}'", raw)))
    }
}

/// The canonical normalized mod entity
///
/// Built fresh on every directory scan; a re-scan of a source replaces all
/// of that source's entries wholesale. Every list-valued field is a strict
/// array - the descriptor format's scalar-or-list ambiguity is resolved at
/// the mapping boundary and never propagates past this type.
#[derive(Debug, Clone, Serialize)]
pub struct Mod {
    /// Stable identity. Falls back to the folder name when the descriptor
    /// omits it.
    pub package_id: PackageId,
    pub name: String,
    /// Deduplicated, trimmed author names in first-seen order.
    pub authors: Vec<String>,
    pub description: String,
    pub url: Option<String>,
    pub steam_workshop_url: Option<String>,
    pub steam_workshop_id: Option<String>,
    pub supported_versions: Vec<f64>,

    pub folder_name: String,
    pub folder_path: PathBuf,
    pub preview_images: Vec<PathBuf>,

    pub mod_dependencies: Vec<ModDependency>,
    pub load_after: Vec<PackageId>,
    pub load_before: Vec<PackageId>,
    pub incompatible_with: Vec<PackageId>,
    pub force_load_before: Vec<PackageId>,
    pub force_load_after: Vec<PackageId>,

    pub descriptions_by_version: BTreeMap<VersionKey, String>,
    pub load_after_by_version: BTreeMap<VersionKey, Vec<ModDependency>>,
    pub mod_dependencies_by_version: BTreeMap<VersionKey, Vec<ModDependency>>,

    /// Current classification, possibly reclassified by a user override.
    pub source: ModSource,
    /// Classification at discovery time; never touched by overrides.
    pub original_source: ModSource,

    /// Expansions carry a Steam app id, the base game does not. Only
    /// populated for core-sourced mods.
    pub steam_app_id: Option<i64>,

    /// Transient UI-filter flag; not part of the mod's identity.
    pub hidden: bool,
}

impl Mod {
    /// Library/selection key for this mod.
    pub fn key(&self) -> String {
        normalize_id(&self.package_id)
    }
}
