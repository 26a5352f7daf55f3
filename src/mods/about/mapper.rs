//! Mapping from the normalized descriptor tree to the canonical Mod
//!
//! Third-party descriptors rely on a lot of leniency: names fall back to
//! folder names, URLs arrive without schemes, every list field may be a
//! bare scalar. All of that is absorbed here; downstream code only ever
//! sees the strict [`Mod`] shape.

use super::document::DocValue;
use super::normalize::into_list;
use crate::mods::{Mod, ModDependency, ModSource, VersionKey};
use crate::scan::ScanDiagnostics;
use regex_lite::Regex;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use url::Url;

/// Scan-side facts about the folder a descriptor came from.
#[derive(Debug)]
pub struct DescriptorContext {
    pub folder_name: String,
    pub folder_path: PathBuf,
    pub source: ModSource,
    pub preview_images: Vec<PathBuf>,
    /// Contents of the workshop id file found next to the descriptor.
    pub steam_workshop_id: Option<String>,
}

/// Build a [`Mod`] from the normalized descriptor tree.
///
/// Individual malformed fields degrade to safe defaults (recorded in the
/// diagnostics where useful); they never fail the mod as a whole.
pub fn map_descriptor(
    meta: &HashMap<String, DocValue>,
    ctx: DescriptorContext,
    diagnostics: &mut ScanDiagnostics,
) -> Mod {
    let field = |name: &str| meta.get(name).filter(|v| !v.is_falsy());
    let text = |name: &str| field(name).and_then(|v| v.as_text());

    let package_id = text("packageId").unwrap_or_else(|| ctx.folder_name.clone());

    let mut url = validate_url(text("url"), diagnostics);

    let steam_workshop_id = match ctx.source {
        ModSource::Workshop => ctx.steam_workshop_id.map(|id| id.trim().to_string()),
        _ => None,
    };
    let steam_workshop_url = steam_workshop_id
        .as_ref()
        .map(|id| format!("steam://url/CommunityFilePage/{}", id));

    // Workshop descriptors often repeat their own workshop page in the
    // url field; suppress it rather than show the same link twice.
    if ctx.source == ModSource::Workshop
        && url.as_deref().is_some_and(|u| u.contains("steamcommunity"))
    {
        url = None;
    }

    let steam_app_id = match ctx.source {
        ModSource::Core => field("steamAppId").and_then(|v| v.as_f64()).map(|n| n as i64),
        _ => None,
    };

    Mod {
        name: text("name").unwrap_or_else(|| ctx.folder_name.clone()),
        authors: split_authors(text("author").as_deref().unwrap_or_default()),
        description: text("description").unwrap_or_else(|| "No description.".to_string()),
        url,
        steam_workshop_url,
        steam_workshop_id,
        supported_versions: into_list(field("supportedVersions").cloned())
            .iter()
            .filter_map(|v| v.as_f64())
            .collect(),
        folder_name: ctx.folder_name,
        folder_path: ctx.folder_path,
        preview_images: ctx.preview_images,
        mod_dependencies: dependency_list(field("modDependencies").cloned()),
        load_after: id_list(field("loadAfter").cloned()),
        load_before: id_list(field("loadBefore").cloned()),
        incompatible_with: id_list(field("incompatibleWith").cloned()),
        force_load_before: id_list(field("forceLoadBefore").cloned()),
        force_load_after: id_list(field("forceLoadAfter").cloned()),
        descriptions_by_version: version_map_strings(field("descriptionsByVersion")),
        load_after_by_version: version_map_dependencies(field("loadAfterByVersion")),
        mod_dependencies_by_version: version_map_dependencies(field("modDependenciesByVersion")),
        source: ctx.source,
        original_source: ctx.source,
        steam_app_id,
        hidden: false,
        package_id,
    }
}

/// Split an author string on commas or a whitespace-delimited "and",
/// trimming tokens and deduplicating in first-seen order.
pub fn split_authors(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }

    let splitter = Regex::new(r",|\sand\s").unwrap();
    let mut authors: Vec<String> = Vec::new();
    for token in splitter.split(raw) {
        let token = token.trim();
        if token.is_empty() || authors.iter().any(|a| a == token) {
            continue;
        }
        authors.push(token.to_string());
    }
    authors
}

/// Strict URL construction, retrying with an `https://` prefix since many
/// descriptors only write the host. Unfixable values become `None`.
fn validate_url(raw: Option<String>, diagnostics: &mut ScanDiagnostics) -> Option<String> {
    let raw = raw?;
    if let Ok(url) = Url::parse(&raw) {
        return Some(url.to_string());
    }
    match Url::parse(&format!("https://{}", raw)) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            diagnostics
                .errors
                .push(format!("invalid url '{}': {}", raw, err));
            None
        }
    }
}

fn id_list(value: Option<DocValue>) -> Vec<String> {
    into_list(value)
        .iter()
        .filter_map(|v| v.as_text())
        .collect()
}

fn dependency_list(value: Option<DocValue>) -> Vec<ModDependency> {
    into_list(value)
        .iter()
        .filter_map(parse_dependency)
        .collect()
}

/// A dependency entry without a packageId cannot be referenced and is
/// dropped.
fn parse_dependency(value: &DocValue) -> Option<ModDependency> {
    let map = value.as_map()?;
    let package_id = map.get("packageId").and_then(|v| v.as_text())?;
    Some(ModDependency {
        display_name: map
            .get("displayName")
            .and_then(|v| v.as_text())
            .unwrap_or_else(|| package_id.clone()),
        steam_workshop_url: map.get("steamWorkshopUrl").and_then(|v| v.as_text()),
        download_url: map.get("downloadUrl").and_then(|v| v.as_text()),
        package_id,
    })
}

fn version_map_strings(value: Option<&DocValue>) -> BTreeMap<VersionKey, String> {
    let mut out = BTreeMap::new();
    let Some(map) = value.and_then(|v| v.as_map()) else {
        return out;
    };
    for (tag, val) in map {
        if val.is_falsy() {
            continue;
        }
        let Some(key) = parse_version_tag(tag) else {
            continue;
        };
        if let Some(text) = val.as_text() {
            out.insert(key, text);
        }
    }
    out
}

/// By-version dependency values may be a single entry or a list of any
/// length; both normalize to the full list (nothing is discarded).
fn version_map_dependencies(value: Option<&DocValue>) -> BTreeMap<VersionKey, Vec<ModDependency>> {
    let mut out = BTreeMap::new();
    let Some(map) = value.and_then(|v| v.as_map()) else {
        return out;
    };
    for (tag, val) in map {
        if val.is_falsy() {
            continue;
        }
        let Some(key) = parse_version_tag(tag) else {
            continue;
        };
        let deps = dependency_list(Some(val.clone()));
        if !deps.is_empty() {
            out.insert(key, deps);
        }
    }
    out
}

fn parse_version_tag(tag: &str) -> Option<VersionKey> {
    match VersionKey::from_tag(tag) {
        Some(key) => Some(key),
        None => {
            tracing::debug!("Ignoring malformed version tag '{}'", tag);
            None
        }
    }
}
