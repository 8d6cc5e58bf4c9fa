//! Shared fixtures for the integration tests: throwaway workspaces on disk.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use css_variables_language_server::config::Settings;
use css_variables_language_server::index::ScanConfig;

pub const LIBRARY: &str = "svelte-ui";

/// A temporary project directory that is removed when dropped.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// An empty workspace without a manifest.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A workspace whose `package.json` depends on [`LIBRARY`].
    pub fn using_library() -> Self {
        let workspace = Self::new();
        workspace.write(
            "package.json",
            &format!(r#"{{ "name": "app", "dependencies": {{ "{}": "^1.0.0" }} }}"#, LIBRARY),
        );
        workspace
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }

    pub fn write_bytes(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, contents).expect("Failed to write fixture file");
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).expect("Failed to remove fixture file");
    }

    /// Scan configuration built from default settings for [`LIBRARY`].
    pub fn scan_config(&self) -> ScanConfig {
        self.scan_config_with(&Settings::new(LIBRARY))
    }

    pub fn scan_config_with(&self, settings: &Settings) -> ScanConfig {
        ScanConfig::new(self.root(), settings).expect("Default patterns should compile")
    }
}
