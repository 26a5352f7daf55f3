//! rimstack - A CLI mod library and load-order tool for RimWorld on Linux
//!
//! This crate provides the mod-metadata engine behind the tool:
//! - Lenient About.xml descriptor parsing into a normalized mod model
//! - Installation-directory scanning with per-run diagnostics
//! - An in-memory mod library keyed by case-insensitive PackageId
//! - An ordered active selection with recursive dependency expansion
//! - Reading the game's native ModsConfig.xml load-order file

pub mod config;
pub mod library;
pub mod loadorder;
pub mod mods;
pub mod scan;

pub use config::Config;
pub use library::{ActiveSelection, AddOptions, ModLibrary, ModManager};
pub use mods::{Mod, ModDependency, ModSource, PackageId, VersionKey};
pub use scan::{scan_directory, ScanDiagnostics, ScanError, ScanOutcome};
