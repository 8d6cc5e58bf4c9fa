//! Symbol index
//!
//! Owns the table of known custom properties. A rebuild scans the configured
//! stylesheets and components into a fresh [`VariableTable`] and then swaps it
//! in as the current snapshot. Readers hold an `Arc` to whichever table was
//! current when they asked and never observe a half-built one.

pub mod extract;
pub mod files;
pub mod manifest;
pub mod variable;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};

use crate::config::Settings;
use crate::error::ScanError;

pub use files::{FilePatterns, WorkspaceFiles};
pub use variable::{Origin, Variable, VariableTable};

/// Number of file reads kept in flight during a rebuild.
const CONCURRENT_READS: usize = 16;

/// Compiled scan inputs for one workspace.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub stylesheets: FilePatterns,
    pub components: FilePatterns,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>, settings: &Settings) -> Result<Self, ScanError> {
        let exclude = settings.exclude_patterns();
        Ok(Self {
            root: root.into(),
            stylesheets: FilePatterns::new(
                &settings.stylesheet_patterns(),
                &exclude,
                &settings.important_stylesheet_patterns(),
            )?,
            components: FilePatterns::new(
                &settings.component_patterns(),
                &exclude,
                &settings.important_component_patterns(),
            )?,
        })
    }
}

/// A file that contributed nothing to a rebuild because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub variables: usize,
    pub failures: Vec<ScanFailure>,
}

/// Process-wide variable table with snapshot reads.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    table: RwLock<Arc<VariableTable>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current table. Cheap; never waits for a rebuild.
    pub fn snapshot(&self) -> Arc<VariableTable> {
        self.table.read().clone()
    }

    /// Scans the workspace into a new table and makes it current.
    ///
    /// Concurrent rebuilds each build their own table; the last one to finish wins.
    pub async fn rebuild(&self, config: &ScanConfig) -> Result<ScanReport, ScanError> {
        let (table, report) = build_table(config).await?;
        *self.table.write() = Arc::new(table);
        Ok(report)
    }

    /// Drops every variable, e.g. when the workspace no longer qualifies.
    pub fn clear(&self) {
        *self.table.write() = Arc::new(VariableTable::new());
    }
}

/// Scans the workspace described by `config` into a fresh table.
pub async fn build_table(config: &ScanConfig) -> Result<(VariableTable, ScanReport), ScanError> {
    let start = Instant::now();

    let files = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || {
            WorkspaceFiles::discover(&config.root, &config.stylesheets, &config.components)
        })
        .await?
    };

    let mut builder = TableBuilder::default();
    let mut report = ScanReport::default();

    for (relative, contents) in read_all(&config.root, files.stylesheets).await {
        match contents {
            Ok(text) => {
                builder.add_stylesheet(&relative, &text);
                report.files_scanned += 1;
            }
            Err(e) => record_failure(&mut report, relative, e),
        }
    }

    for (relative, contents) in read_all(&config.root, files.components).await {
        match contents {
            Ok(text) => {
                builder.add_component(&relative, &text);
                report.files_scanned += 1;
            }
            Err(e) => record_failure(&mut report, relative, e),
        }
    }

    let table = builder.finish();
    report.variables = table.len();
    info!(
        "Indexed {} CSS variables from {} files in {:?} ({} failures)",
        report.variables,
        report.files_scanned,
        start.elapsed(),
        report.failures.len()
    );
    Ok((table, report))
}

/// Reads every file concurrently, yielding results in input order.
async fn read_all(root: &Path, paths: Vec<PathBuf>) -> Vec<(PathBuf, Result<String, ScanError>)> {
    stream::iter(paths)
        .map(|relative| async move {
            let path = root.join(&relative);
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ScanError::Read { path, source });
            (relative, contents)
        })
        .buffered(CONCURRENT_READS)
        .collect()
        .await
}

fn record_failure(report: &mut ScanReport, path: PathBuf, error: ScanError) {
    warn!("Skipping {:?}: {}", path, error);
    report.failures.push(ScanFailure {
        path,
        message: error.to_string(),
    });
}

/// Applies extraction results to a table in precedence order.
#[derive(Debug, Default)]
struct TableBuilder {
    table: VariableTable,
    /// Names declared by `@property` rules during this rebuild.
    formal_names: HashSet<String>,
}

impl TableBuilder {
    fn add_stylesheet(&mut self, relative: &Path, text: &str) {
        let formal = extract::property_declarations(text);
        let plain = extract::plain_declarations(text);
        trace!(
            "{:?}: {} @property rules, {} declarations",
            relative,
            formal.len(),
            plain.len()
        );

        for declaration in formal {
            self.formal_names.insert(declaration.name.clone());
            self.insert(declaration, Origin::Global, relative);
        }
        for declaration in plain {
            if self.formal_names.contains(&declaration.name) {
                continue;
            }
            self.insert(declaration, Origin::Global, relative);
        }
    }

    fn add_component(&mut self, relative: &Path, text: &str) {
        let Some(component) = component_name(relative) else {
            debug!("Skipping component without a file name: {:?}", relative);
            return;
        };

        for declaration in extract::component_tags(text) {
            self.insert(declaration, Origin::Component(component.clone()), relative);
        }
    }

    fn insert(&mut self, declaration: extract::Declaration, origin: Origin, relative: &Path) {
        self.table.insert(Variable {
            name: declaration.name,
            description: declaration.description,
            value: declaration.value,
            origin,
            source_file: relative.to_path_buf(),
        });
    }

    fn finish(self) -> VariableTable {
        self.table
    }
}

/// Component name of a file: its base name without extension.
pub fn component_name(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formal_declaration_suppresses_plain() {
        let mut builder = TableBuilder::default();
        builder.add_stylesheet(
            Path::new("theme.css"),
            "/* Accent */\n@property --accent { syntax: '<color>'; }\n:root { /* plain */ --accent: red; }",
        );
        let table = builder.finish();

        let accent = table.get("--accent").unwrap();
        assert_eq!(accent.origin, Origin::Global);
        assert_eq!(
            accent.description.as_deref(),
            Some("Accent\n\n```css\nsyntax: '<color>'\n```")
        );
    }

    #[test]
    fn test_formal_precedence_spans_files() {
        let mut builder = TableBuilder::default();
        builder.add_stylesheet(Path::new("a.css"), "@property --gap { initial-value: 4px; }");
        builder.add_stylesheet(Path::new("b.css"), "--gap: 8px;");
        let table = builder.finish();

        let gap = table.get("--gap").unwrap();
        assert_eq!(gap.source_file, PathBuf::from("a.css"));
        assert_eq!(gap.value.as_deref(), Some("4px"));
    }

    #[test]
    fn test_component_tags_are_scoped() {
        let mut builder = TableBuilder::default();
        builder.add_component(
            Path::new("node_modules/ui/Button.svelte"),
            "<!-- @cssprop --btn-size - Controls button size -->",
        );
        let table = builder.finish();

        let size = table.get("--btn-size").unwrap();
        assert_eq!(size.origin, Origin::Component("Button".to_string()));
        assert_eq!(size.description.as_deref(), Some("Controls button size"));
        assert_eq!(size.source_file, PathBuf::from("node_modules/ui/Button.svelte"));
    }

    #[test]
    fn test_component_name() {
        assert_eq!(component_name(Path::new("lib/Card.svelte")).as_deref(), Some("Card"));
        assert_eq!(component_name(Path::new("lib/Card.test.svelte")).as_deref(), Some("Card.test"));
    }

    #[test]
    fn test_snapshot_is_replaced_not_mutated() {
        let index = SymbolIndex::new();
        let before = index.snapshot();
        *index.table.write() = Arc::new(
            [Variable {
                name: "--x".to_string(),
                description: None,
                value: None,
                origin: Origin::Global,
                source_file: PathBuf::from("x.css"),
            }]
            .into_iter()
            .collect(),
        );

        assert!(before.is_empty());
        assert_eq!(index.snapshot().len(), 1);
        index.clear();
        assert!(index.snapshot().is_empty());
    }
}
