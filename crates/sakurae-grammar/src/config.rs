//! Loader configuration.
//!
//! Grammar artifacts are looked up in an ordered list of directories. Order:
//! `SAKURAE_GRAMMAR_PATH`, user config dir, user data dir, then `grammars/`
//! next to the running executable.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Environment variable holding extra grammar directories, in `PATH` syntax.
pub const GRAMMAR_PATH_ENV: &str = "SAKURAE_GRAMMAR_PATH";

/// Oldest compiled-parser ABI the tree-sitter runtime still accepts.
pub const MIN_COMPATIBLE_ABI_VERSION: u32 = 13;

/// Newest compiled-parser ABI the tree-sitter runtime understands.
pub const ABI_VERSION: u32 = 15;

/// Where to look for grammar artifacts and which parsers to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Directories searched in order.
    pub search_paths: Vec<PathBuf>,
    /// Accepted compiled-parser ABI versions.
    pub abi_versions: RangeInclusive<u32>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            abi_versions: MIN_COMPATIBLE_ABI_VERSION..=ABI_VERSION,
        }
    }
}

impl LoaderConfig {
    /// Builds the default search path list from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut search_paths = Vec::new();

        if let Some(paths) = std::env::var_os(GRAMMAR_PATH_ENV) {
            search_paths.extend(std::env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }

        // ~/.config/sakurae/grammars
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("sakurae").join("grammars"));
        }

        if let Some(data_dir) = dirs::data_local_dir() {
            search_paths.push(data_dir.join("sakurae").join("grammars"));
        }

        // Bundled grammars relative to executable
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_paths.push(exe_dir.join("grammars"));
        }

        Self {
            search_paths,
            ..Self::default()
        }
    }

    /// Appends a search directory.
    #[must_use]
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    /// Replaces the accepted ABI range.
    #[must_use]
    pub fn with_abi_versions(mut self, versions: RangeInclusive<u32>) -> Self {
        self.abi_versions = versions;
        self
    }

    /// Returns the first `<dir>/<file_name>` that exists.
    #[must_use]
    pub fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        self.search_paths.iter().map(|dir| dir.join(file_name)).find(|candidate| {
            let found = candidate.is_file();
            tracing::trace!(path = %candidate.display(), found, "probing grammar search path");
            found
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_abi_range() {
        let config = LoaderConfig::default();
        assert!(config.abi_versions.contains(&14));
        assert!(config.abi_versions.contains(&ABI_VERSION));
        assert!(!config.abi_versions.contains(&12));
        assert!(config.search_paths.is_empty());
    }

    #[test]
    fn test_from_env_has_exe_relative_path() {
        let config = LoaderConfig::from_env();
        assert!(config
            .search_paths
            .last()
            .is_some_and(|dir| dir.ends_with("grammars")));
    }

    #[test]
    fn test_resolve_prefers_earlier_paths() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("sakurae.json"), "{}").unwrap();

        let config = LoaderConfig::default()
            .with_search_path(first.path())
            .with_search_path(second.path());
        assert_eq!(
            config.resolve("sakurae.json"),
            Some(second.path().join("sakurae.json"))
        );

        fs::write(first.path().join("sakurae.json"), "{}").unwrap();
        assert_eq!(
            config.resolve("sakurae.json"),
            Some(first.path().join("sakurae.json"))
        );
        assert_eq!(config.resolve("other.json"), None);
    }
}
