//! Mod library and the manager facade over library + selection
//!
//! The library maps lowercased PackageId to the mod most recently scanned
//! under that id. It is owned by the manager and mutated only through the
//! operations here; a re-scan of a source replaces that source's entries
//! wholesale (last write wins across re-scans).

pub mod selection;

pub use selection::{ActiveSelection, AddOptions, SelectionEntry};

use crate::mods::{normalize_id, Mod, ModSource};
use crate::scan::{self, ScanDiagnostics, ScanError};
use std::collections::HashMap;
use std::path::Path;

/// All known mods, keyed by lowercased PackageId.
#[derive(Debug, Default)]
pub struct ModLibrary {
    mods: HashMap<String, Mod>,
}

impl ModLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a mod under its id.
    pub fn upsert(&mut self, m: Mod) {
        self.mods.insert(m.key(), m);
    }

    pub fn remove(&mut self, id: &str) -> Option<Mod> {
        self.mods.remove(&normalize_id(id))
    }

    /// Drop every mod whose discovery-time source matches. User
    /// reclassifications don't shelter a mod from its origin's re-scan.
    pub fn reset_source(&mut self, source: ModSource) {
        self.mods.retain(|_, m| m.original_source != source);
    }

    pub fn clear(&mut self) {
        self.mods.clear();
    }

    pub fn get(&self, id: &str) -> Option<&Mod> {
        self.mods.get(&normalize_id(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Mod> {
        self.mods.get_mut(&normalize_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mod> {
        self.mods.values()
    }

    pub fn count_by_source(&self, source: ModSource) -> usize {
        self.mods.values().filter(|m| m.source == source).count()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}

/// Owner of all engine state: the library, the active selection, the
/// hidden set, and the user's source-override table.
///
/// The surrounding host serializes calls onto one thread; nothing here
/// locks. Every public mutation keeps the selection's lookup cache
/// consistent with the library.
#[derive(Debug, Default)]
pub struct ModManager {
    library: ModLibrary,
    selection: ActiveSelection,
    hidden: Vec<String>,
    /// Per-PackageId source reclassifications (lowercased keys). Applied
    /// to `source` at scan time; `original_source` is never touched.
    source_overrides: HashMap<String, ModSource>,
}

impl ModManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(source_overrides: HashMap<String, ModSource>) -> Self {
        let source_overrides = source_overrides
            .into_iter()
            .map(|(id, source)| (normalize_id(&id), source))
            .collect();
        Self {
            source_overrides,
            ..Self::default()
        }
    }

    pub fn library(&self) -> &ModLibrary {
        &self.library
    }

    pub fn selection(&self) -> &ActiveSelection {
        &self.selection
    }

    /// Scan one source root and replace that source's library bucket with
    /// the result. Per-item failures come back in the diagnostics; a
    /// thrown error means the scan could not start and the library is
    /// untouched.
    pub fn scan_source(
        &mut self,
        root: &Path,
        source: ModSource,
    ) -> Result<ScanDiagnostics, ScanError> {
        let outcome = scan::scan_directory(root, source)?;
        self.replace_source(source, outcome.mods);
        Ok(outcome.diagnostics)
    }

    /// Replace a source bucket with freshly scanned mods, applying the
    /// override table to each mod's current classification.
    pub fn replace_source(&mut self, source: ModSource, mods: Vec<Mod>) {
        self.library.reset_source(source);
        for mut m in mods {
            if let Some(&reclassified) = self.source_overrides.get(&m.key()) {
                m.source = reclassified;
            }
            self.library.upsert(m);
        }
        self.selection.refresh(&self.library);
    }

    /// Add mods to the active selection. See [`ActiveSelection::add`].
    pub fn selection_add(&mut self, package_ids: &[String], options: AddOptions) {
        self.selection.add(&self.library, package_ids, options);
    }

    pub fn selection_remove(&mut self, package_ids: &[String]) {
        self.selection.remove(package_ids);
    }

    pub fn selection_clear(&mut self) {
        self.selection.clear();
    }

    /// Remove every library mod discovered under the given source.
    pub fn library_reset_by_source(&mut self, source: ModSource) {
        self.library.reset_source(source);
        self.selection.refresh(&self.library);
    }

    /// Hide exactly the given ids, unhiding everything hidden before.
    pub fn set_hidden(&mut self, package_ids: &[String]) {
        for id in self.hidden.drain(..) {
            if let Some(m) = self.library.mods.get_mut(&id) {
                m.hidden = false;
            }
        }
        for id in package_ids {
            let id = normalize_id(id);
            if let Some(m) = self.library.mods.get_mut(&id) {
                m.hidden = true;
                self.hidden.push(id);
            }
        }
        self.selection.refresh(&self.library);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn fixture(id: &str, source: ModSource) -> Mod {
        Mod {
            package_id: id.to_string(),
            name: id.to_string(),
            authors: Vec::new(),
            description: "No description.".to_string(),
            url: None,
            steam_workshop_url: None,
            steam_workshop_id: None,
            supported_versions: vec![1.3],
            folder_name: id.to_string(),
            folder_path: PathBuf::from("/mods").join(id),
            preview_images: Vec::new(),
            mod_dependencies: Vec::new(),
            load_after: Vec::new(),
            load_before: Vec::new(),
            incompatible_with: Vec::new(),
            force_load_before: Vec::new(),
            force_load_after: Vec::new(),
            descriptions_by_version: BTreeMap::new(),
            load_after_by_version: BTreeMap::new(),
            mod_dependencies_by_version: BTreeMap::new(),
            source,
            original_source: source,
            steam_app_id: None,
            hidden: false,
        }
    }

    #[test]
    fn test_library_lookups_are_case_insensitive() {
        let mut library = ModLibrary::new();
        library.upsert(fixture("Author.ModName", ModSource::Local));

        assert!(library.get("author.modname").is_some());
        assert!(library.get("AUTHOR.MODNAME").is_some());
        assert_eq!(
            library.get("author.modname").unwrap().package_id,
            "Author.ModName"
        );
    }

    #[test]
    fn test_upsert_is_last_write_wins() {
        let mut library = ModLibrary::new();
        let mut first = fixture("a.b", ModSource::Local);
        first.name = "First".to_string();
        let mut second = fixture("A.B", ModSource::Local);
        second.name = "Second".to_string();

        library.upsert(first);
        library.upsert(second);

        assert_eq!(library.len(), 1);
        assert_eq!(library.get("a.b").unwrap().name, "Second");
    }

    #[test]
    fn test_reset_source_matches_original_source() {
        let mut overrides = HashMap::new();
        overrides.insert("w.one".to_string(), ModSource::Core);
        let mut manager = ModManager::with_overrides(overrides);

        manager.replace_source(
            ModSource::Workshop,
            vec![fixture("w.one", ModSource::Workshop)],
        );
        manager.replace_source(ModSource::Local, vec![fixture("l.one", ModSource::Local)]);

        // the override reclassified the current source only
        let m = manager.library().get("w.one").unwrap();
        assert_eq!(m.source, ModSource::Core);
        assert_eq!(m.original_source, ModSource::Workshop);

        // reset by the discovery-time source still removes it
        manager.library_reset_by_source(ModSource::Workshop);
        assert!(manager.library().get("w.one").is_none());
        assert!(manager.library().get("l.one").is_some());
    }

    #[test]
    fn test_rescan_replaces_bucket_wholesale() {
        let mut manager = ModManager::new();
        manager.replace_source(
            ModSource::Local,
            vec![
                fixture("keep.me", ModSource::Local),
                fixture("drop.me", ModSource::Local),
            ],
        );
        manager.replace_source(ModSource::Local, vec![fixture("keep.me", ModSource::Local)]);

        assert!(manager.library().get("keep.me").is_some());
        assert!(manager.library().get("drop.me").is_none());
    }

    #[test]
    fn test_selection_survives_rescan_with_unresolved_entry() {
        let mut manager = ModManager::new();
        manager.replace_source(ModSource::Local, vec![fixture("x.mod", ModSource::Local)]);
        manager.selection_add(&["x.mod".to_string()], AddOptions::default());
        assert!(manager.selection().resolve("x.mod").is_some());

        // mod vanished from disk between scans
        manager.replace_source(ModSource::Local, Vec::new());

        assert_eq!(manager.selection().order(), ["x.mod"]);
        assert!(manager.selection().resolve("x.mod").is_none());
    }

    #[test]
    fn test_set_hidden_replaces_previous_set() {
        let mut manager = ModManager::new();
        manager.replace_source(
            ModSource::Local,
            vec![
                fixture("a.one", ModSource::Local),
                fixture("b.two", ModSource::Local),
            ],
        );

        manager.set_hidden(&["a.one".to_string()]);
        assert!(manager.library().get("a.one").unwrap().hidden);
        assert!(!manager.library().get("b.two").unwrap().hidden);

        manager.set_hidden(&["b.two".to_string()]);
        assert!(!manager.library().get("a.one").unwrap().hidden);
        assert!(manager.library().get("b.two").unwrap().hidden);
    }
}
