//! Active mod selection - the ordered, enabled mod list
//!
//! The ordered PackageId sequence is the source of truth for load order;
//! the lookup table is a cache kept consistent with every mutation. Ids
//! that don't resolve in the library stay in the sequence so the host can
//! render a "file not found" row without losing the user's list.

use super::ModLibrary;
use crate::mods::{normalize_id, Mod, VersionKey};
use std::collections::HashSet;

/// Options for [`ActiveSelection::add`].
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Position to start inserting at; appended to the end if omitted.
    pub index: Option<usize>,
    /// Recursively add each mod's dependencies first.
    pub expand_dependencies: bool,
    /// Game version whose by-version dependency entries participate in
    /// expansion.
    pub active_version: Option<VersionKey>,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            index: None,
            expand_dependencies: true,
            active_version: None,
        }
    }
}

/// One row of the selection: the id, and the mod if the library knows it.
#[derive(Debug)]
pub struct SelectionEntry<'a> {
    pub package_id: &'a str,
    pub resolved: Option<&'a Mod>,
}

/// The user's current ordered, enabled mod list.
#[derive(Debug, Default)]
pub struct ActiveSelection {
    /// Lowercased ids in load order. Duplicates are forbidden.
    order: Vec<String>,
    /// Cache of resolved mods; absent entry = unknown id.
    lookup: std::collections::HashMap<String, Mod>,
}

impl ActiveSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add package ids, expanding dependencies first unless disabled.
    ///
    /// Dependencies are resolved recursively with a per-call visited set,
    /// so circular dependency graphs terminate and no id is inserted
    /// twice. With `index` set, insertion starts there and tracks the
    /// moving insertion point; otherwise ids append at the end. Ids the
    /// library doesn't know are still added to the sequence.
    pub fn add(&mut self, library: &ModLibrary, package_ids: &[String], options: AddOptions) {
        let mut insert_at = options.index.map(|i| i.min(self.order.len()));
        let mut visited = HashSet::new();
        for id in package_ids {
            self.add_one(
                library,
                &normalize_id(id),
                &options,
                &mut insert_at,
                &mut visited,
            );
        }
    }

    fn add_one(
        &mut self,
        library: &ModLibrary,
        id: &str,
        options: &AddOptions,
        insert_at: &mut Option<usize>,
        visited: &mut HashSet<String>,
    ) {
        if !visited.insert(id.to_string()) {
            return;
        }

        let known = library.get(id);

        if options.expand_dependencies {
            if let Some(m) = known {
                // version-specific entries first, then the unconditional
                // list; order within one mod is stable, duplicates merge
                let mut dep_ids: Vec<String> = Vec::new();
                let versioned = options
                    .active_version
                    .and_then(|v| m.mod_dependencies_by_version.get(&v));
                for dep in versioned.into_iter().flatten().chain(&m.mod_dependencies) {
                    let dep_id = normalize_id(&dep.package_id);
                    if !dep_ids.contains(&dep_id) {
                        dep_ids.push(dep_id);
                    }
                }
                for dep_id in dep_ids {
                    self.add_one(library, &dep_id, options, insert_at, visited);
                }
            }
        }

        if !self.order.iter().any(|existing| existing == id) {
            match insert_at {
                Some(i) => {
                    self.order.insert(*i, id.to_string());
                    *i += 1;
                }
                None => self.order.push(id.to_string()),
            }
        }

        match library.get(id) {
            Some(m) => {
                self.lookup.insert(id.to_string(), m.clone());
            }
            None => tracing::warn!("Failed to find mod with PackageId {}", id),
        }
    }

    /// Remove ids from the sequence and the cache. Removing an id that
    /// isn't present is a no-op.
    pub fn remove(&mut self, package_ids: &[String]) {
        for id in package_ids {
            let id = normalize_id(id);
            self.lookup.remove(&id);
            self.order.retain(|existing| *existing != id);
        }
    }

    /// Empty the selection entirely.
    pub fn clear(&mut self) {
        self.order.clear();
        self.lookup.clear();
    }

    /// Re-resolve the cache against the library after its contents
    /// changed. The ordered sequence is untouched.
    pub fn refresh(&mut self, library: &ModLibrary) {
        self.lookup.clear();
        for id in &self.order {
            if let Some(m) = library.get(id) {
                self.lookup.insert(id.clone(), m.clone());
            }
        }
    }

    /// The ordered id sequence (load order).
    pub fn order(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, id: &str) -> bool {
        let id = normalize_id(id);
        self.order.iter().any(|existing| *existing == id)
    }

    pub fn resolve(&self, id: &str) -> Option<&Mod> {
        self.lookup.get(&normalize_id(id))
    }

    /// Rows in load order, with unresolved ids distinguishable.
    pub fn entries(&self) -> impl Iterator<Item = SelectionEntry<'_>> {
        self.order.iter().map(|id| SelectionEntry {
            package_id: id,
            resolved: self.lookup.get(id),
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
