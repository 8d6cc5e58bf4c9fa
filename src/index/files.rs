//! Glob-based file discovery
//!
//! The workspace is walked once per rebuild. Every file is matched, by its
//! path relative to the workspace root, against the stylesheet and component
//! pattern sets. Results come back sorted so that rebuilds are reproducible.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::ScanError;

/// Search, exclusion, and always-included patterns for one kind of file.
#[derive(Debug, Clone)]
pub struct FilePatterns {
    include: GlobSet,
    exclude: GlobSet,
    important: GlobSet,
    /// Literal directory prefixes of the important patterns.
    important_roots: Vec<PathBuf>,
}

impl FilePatterns {
    pub fn new(include: &[String], exclude: &[String], important: &[String]) -> Result<Self, ScanError> {
        Ok(Self {
            include: build_glob_set(include)?,
            exclude: build_glob_set(exclude)?,
            important: build_glob_set(important)?,
            important_roots: important.iter().map(|pattern| literal_prefix(pattern)).collect(),
        })
    }

    /// Whether the file at `relative` belongs to this set.
    ///
    /// Important patterns win over exclusions; search patterns do not.
    pub fn matches(&self, relative: &Path) -> bool {
        self.important.is_match(relative)
            || (self.include.is_match(relative) && !self.exclude.is_match(relative))
    }

    /// Whether the walk may skip the directory at `relative` entirely.
    fn prunes(&self, relative: &Path) -> bool {
        if !self.exclude.is_match(relative) {
            return false;
        }
        // Keep directories on the way to, or inside, an important root
        !self
            .important_roots
            .iter()
            .any(|root| root.starts_with(relative) || relative.starts_with(root))
    }
}

/// Files selected by a workspace walk, as paths relative to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceFiles {
    pub stylesheets: Vec<PathBuf>,
    pub components: Vec<PathBuf>,
}

impl WorkspaceFiles {
    /// Walks `root` and sorts every file into the stylesheet and component lists.
    ///
    /// Unreadable directory entries are logged and skipped.
    pub fn discover(root: &Path, stylesheets: &FilePatterns, components: &FilePatterns) -> Self {
        let mut found_stylesheets = BTreeSet::new();
        let mut found_components = BTreeSet::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                match entry.path().strip_prefix(root) {
                    Ok(relative) => !(stylesheets.prunes(relative) && components.prunes(relative)),
                    Err(_) => true,
                }
            });

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable workspace entry: {}", ScanError::Walk(e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };

            if stylesheets.matches(relative) {
                found_stylesheets.insert(relative.to_path_buf());
            }
            if components.matches(relative) {
                found_components.insert(relative.to_path_buf());
            }
        }

        debug!(
            "Discovered {} stylesheets and {} components under {:?}",
            found_stylesheets.len(),
            found_components.len(),
            root
        );

        Self {
            stylesheets: found_stylesheets.into_iter().collect(),
            components: found_components.into_iter().collect(),
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ScanError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ScanError::InvalidPattern {
        pattern: patterns.join(", "),
        source,
    })
}

/// Leading path components of `pattern` that contain no glob syntax.
fn literal_prefix(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|component| match component {
            Component::Normal(part) => !part.to_string_lossy().contains(['*', '?', '[', '{']),
            _ => false,
        })
        .collect()
}
