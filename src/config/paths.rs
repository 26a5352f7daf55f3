//! XDG-compliant path management

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths following the XDG base directory specification
#[derive(Debug, Clone)]
pub struct Paths {
    dirs: ProjectDirs,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let dirs = ProjectDirs::from("", "", "rimstack")
            .expect("Failed to determine project directories");
        Self { dirs }
    }

    /// Config directory: ~/.config/rimstack/
    pub fn config_dir(&self) -> PathBuf {
        self.dirs.config_dir().to_path_buf()
    }

    /// Main config file: ~/.config/rimstack/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    /// Log directory: ~/.cache/rimstack/
    pub fn log_dir(&self) -> PathBuf {
        self.dirs.cache_dir().to_path_buf()
    }

    /// Ensure required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.config_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }
}
