//! Installation-directory scanning
//!
//! Walks the immediate children of a mod root, validates each folder's
//! `About/` structure, and runs the descriptor pipeline per mod. A single
//! corrupt mod never halts the scan; everything non-fatal lands in the
//! per-run [`ScanDiagnostics`]. Only an unreadable root propagates.

use crate::mods::about::{self, DescriptorContext, DocumentOptions};
use crate::mods::{Mod, ModSource};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-scan counters and skip lists. Produced fresh on every scan and
/// surfaced to logs only; never persisted.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanDiagnostics {
    /// Immediate children of the root that look like files.
    pub files: usize,
    /// Immediate children of the root that look like mod folders.
    pub folders: usize,

    /// Mod folders with no `About` subdirectory.
    pub missing_about_folder: Vec<String>,
    /// Mod folders whose `About` directory has no `About.xml`.
    pub missing_about_xml: Vec<String>,
    /// Mod folders whose descriptor failed to parse.
    pub invalid_xml: Vec<String>,

    /// Everything else: unreadable id files, bad URLs, mid-scan I/O
    /// failures on a single folder.
    pub errors: Vec<String>,
}

impl ScanDiagnostics {
    /// Number of mod folders that produced no Mod.
    pub fn skipped(&self) -> usize {
        self.missing_about_folder.len() + self.missing_about_xml.len() + self.invalid_xml.len()
    }

    pub fn record_error(&mut self, context: &str, err: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", context, err));
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Failed to read mod root {path}: {source}")]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of scanning one source root.
#[derive(Debug, Serialize)]
pub struct ScanOutcome {
    pub mods: Vec<Mod>,
    pub diagnostics: ScanDiagnostics,
}

/// Scan a mod installation root with default descriptor options.
pub fn scan_directory(root: &Path, source: ModSource) -> Result<ScanOutcome, ScanError> {
    scan_directory_with(root, source, &DocumentOptions::default())
}

/// Scan a mod installation root, handing each well-formed folder to the
/// descriptor pipeline. Returns a fresh mod list; callers replace their
/// corresponding source bucket wholesale.
pub fn scan_directory_with(
    root: &Path,
    source: ModSource,
    options: &DocumentOptions,
) -> Result<ScanOutcome, ScanError> {
    tracing::info!("Scanning {} ({})", root.display(), source);

    let entries = fs::read_dir(root).map_err(|e| ScanError::Root {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut diagnostics = ScanDiagnostics::default();
    let mut folders = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                diagnostics.record_error("directory entry", e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        // The directory contract names mod folders without extensions;
        // anything with a dot is a stray file (or a hidden entry).
        if name.contains('.') {
            diagnostics.files += 1;
        } else {
            diagnostics.folders += 1;
            folders.push(name);
        }
    }
    folders.sort();

    let mut mods = Vec::new();
    for folder in &folders {
        tracing::debug!("Processing mod folder {}", folder);

        let files = match collect_mod_files(root, folder, &mut diagnostics) {
            Ok(Some(files)) => files,
            Ok(None) => continue,
            Err(e) => {
                // permission error or similar on this one folder
                diagnostics.record_error(folder, e);
                continue;
            }
        };

        let Some(meta) = about::parse_descriptor(&files.descriptor_text, folder, options, &mut diagnostics)
        else {
            continue;
        };

        let ctx = DescriptorContext {
            folder_name: folder.clone(),
            folder_path: root.join(folder),
            source,
            preview_images: files.preview_images,
            steam_workshop_id: files.steam_workshop_id,
        };
        mods.push(about::map_descriptor(&meta, ctx, &mut diagnostics));
    }

    tracing::info!(
        "Scan of {} complete: {} mods, {} skipped, {} errors",
        root.display(),
        mods.len(),
        diagnostics.skipped(),
        diagnostics.errors.len()
    );

    Ok(ScanOutcome { mods, diagnostics })
}

struct ModFiles {
    descriptor_text: String,
    preview_images: Vec<PathBuf>,
    steam_workshop_id: Option<String>,
}

/// Validate one mod folder's structure and gather its descriptor text and
/// auxiliary assets. `Ok(None)` means a structural skip already recorded
/// in the diagnostics.
fn collect_mod_files(
    root: &Path,
    folder: &str,
    diagnostics: &mut ScanDiagnostics,
) -> std::io::Result<Option<ModFiles>> {
    let mod_path = root.join(folder);

    let Some(about_dir) = find_subdir(&mod_path, |name| name.eq_ignore_ascii_case("about"))? else {
        diagnostics.missing_about_folder.push(folder.to_string());
        return Ok(None);
    };

    let mut about_file = None;
    let mut id_file = None;
    let mut preview_images = Vec::new();
    for entry in fs::read_dir(&about_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name == "about.xml" {
            about_file = Some(entry.path());
        } else if name == "publishedfileid.txt" {
            id_file = Some(entry.path());
        } else if name.ends_with(".png") {
            preview_images.push(entry.path());
        }
    }
    preview_images.sort();

    // Read the workshop id leniently; a bad id file must not cost the mod.
    let steam_workshop_id = id_file.and_then(|path| match fs::read_to_string(&path) {
        Ok(contents) => Some(contents),
        Err(e) => {
            diagnostics.record_error(&path.display().to_string(), e);
            None
        }
    });

    let Some(about_file) = about_file else {
        diagnostics.missing_about_xml.push(folder.to_string());
        return Ok(None);
    };

    let bytes = fs::read(&about_file)?;
    Ok(Some(ModFiles {
        descriptor_text: about::decode_descriptor_bytes(&bytes),
        preview_images,
        steam_workshop_id,
    }))
}

/// First subdirectory whose name matches, case-insensitively.
fn find_subdir(
    dir: &Path,
    matches: impl Fn(&str) -> bool,
) -> std::io::Result<Option<PathBuf>> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        if matches(&entry.file_name().to_string_lossy()) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GOOD_XML: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
        <ModMetaData>\n\
        <name>Good Mod</name>\n\
        <packageId>author.goodmod</packageId>\n\
        <author>Author</author>\n\
        <supportedVersions><li>1.3</li></supportedVersions>\n\
        </ModMetaData>";

    fn write_mod(root: &Path, folder: &str, about_xml: Option<&str>) {
        let about = root.join(folder).join("About");
        fs::create_dir_all(&about).unwrap();
        if let Some(xml) = about_xml {
            fs::write(about.join("About.xml"), xml).unwrap();
        }
    }

    #[test]
    fn test_mixed_directory_scenario() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        write_mod(root, "GoodMod", Some(GOOD_XML));
        // folder with no About/ at all
        fs::create_dir_all(root.join("NoAbout")).unwrap();
        // folder with a malformed descriptor
        write_mod(root, "BadXml", Some("<ModMetaData><name>oops"));
        // stray file at the root
        fs::write(root.join("readme.txt"), "hi").unwrap();

        let outcome = scan_directory(root, ModSource::Local).unwrap();

        assert_eq!(outcome.mods.len(), 1);
        assert_eq!(outcome.mods[0].package_id, "author.goodmod");
        assert_eq!(outcome.diagnostics.folders, 3);
        assert_eq!(outcome.diagnostics.files, 1);
        assert_eq!(outcome.diagnostics.missing_about_folder, vec!["NoAbout"]);
        assert_eq!(outcome.diagnostics.invalid_xml, vec!["BadXml"]);
        assert!(outcome.diagnostics.missing_about_xml.is_empty());
    }

    #[test]
    fn test_case_insensitive_structure() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let about = root.join("CasedMod").join("ABOUT");
        fs::create_dir_all(&about).unwrap();
        fs::write(about.join("ABOUT.XML"), GOOD_XML).unwrap();
        fs::write(about.join("PublishedFileID.TXT"), "123456\n").unwrap();
        fs::write(about.join("Preview.PNG"), [0u8; 4]).unwrap();

        let outcome = scan_directory(root, ModSource::Workshop).unwrap();
        assert_eq!(outcome.mods.len(), 1);

        let m = &outcome.mods[0];
        assert_eq!(m.steam_workshop_id.as_deref(), Some("123456"));
        assert_eq!(
            m.steam_workshop_url.as_deref(),
            Some("steam://url/CommunityFilePage/123456")
        );
        assert_eq!(m.preview_images.len(), 1);
    }

    #[test]
    fn test_missing_about_xml_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_mod(root, "EmptyAbout", None);

        let outcome = scan_directory(root, ModSource::Local).unwrap();
        assert!(outcome.mods.is_empty());
        assert_eq!(outcome.diagnostics.missing_about_xml, vec!["EmptyAbout"]);
    }

    #[test]
    fn test_unreadable_root_is_a_top_level_error() {
        let result = scan_directory(Path::new("/nonexistent/mod/root"), ModSource::Local);
        assert!(matches!(result, Err(ScanError::Root { .. })));
    }

    #[test]
    fn test_mods_are_fresh_per_scan() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_mod(root, "GoodMod", Some(GOOD_XML));

        let first = scan_directory(root, ModSource::Local).unwrap();
        fs::remove_dir_all(root.join("GoodMod")).unwrap();
        let second = scan_directory(root, ModSource::Local).unwrap();

        assert_eq!(first.mods.len(), 1);
        assert!(second.mods.is_empty());
    }
}
