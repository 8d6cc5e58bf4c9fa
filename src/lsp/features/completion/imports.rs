//! Import resolution
//!
//! Collects the component names a document imports from the UI library. The
//! set is recomputed from the full document text on every completion request.
//!
//! A namespace import (`import * as UI from 'lib'`) exposes every component of
//! the library, since members are only named at their use sites.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::index::component_name;

static IMPORT_STATEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\bimport\b\s*(?:(?P<default>[A-Za-z_$][\w$]*)\s*,?\s*)?(?:\*\s*as\s+(?P<namespace>[A-Za-z_$][\w$]*)\s*|\{(?P<named>[^}]*)\}\s*)?from\s*['"](?P<source>[^'"]+)['"]"#,
    )
    .expect("import statement pattern is valid")
});

/// Component names imported by one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    components: HashSet<String>,
    whole_library: bool,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `text` for imports whose source is `library` or a path inside it.
    pub fn from_document(text: &str, library: &str) -> Self {
        let mut imports = ImportSet::new();

        for captures in IMPORT_STATEMENT.captures_iter(text) {
            let source = &captures["source"];
            if !is_library_source(source, library) {
                continue;
            }

            if let Some(default) = captures.name("default") {
                let ident = default.as_str();
                if ident != "type" {
                    // `import Button from 'lib/Button.svelte'` names the file, not the binding
                    let name = if source.ends_with(".svelte") {
                        component_name(Path::new(source)).unwrap_or_else(|| ident.to_string())
                    } else {
                        ident.to_string()
                    };
                    imports.insert(name);
                }
            }

            if captures.name("namespace").is_some() {
                imports.whole_library = true;
            }

            if let Some(named) = captures.name("named") {
                for specifier in named.as_str().split(',') {
                    if let Some(name) = exported_name(specifier) {
                        imports.insert(name.to_string());
                    }
                }
            }
        }

        imports
    }

    pub fn insert(&mut self, component: impl Into<String>) {
        self.components.insert(component.into());
    }

    /// Whether variables owned by `component` are visible to the document.
    pub fn contains(&self, component: &str) -> bool {
        self.whole_library || self.components.contains(component)
    }

    /// True once a namespace import has made every library component visible.
    pub fn covers_whole_library(&self) -> bool {
        self.whole_library
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.whole_library && self.components.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ImportSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut imports = ImportSet::new();
        for component in iter {
            imports.insert(component);
        }
        imports
    }
}

fn is_library_source(source: &str, library: &str) -> bool {
    source == library
        || source
            .strip_prefix(library)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Exported name of an import specifier: `Button`, `Button as Btn`, `type Props`.
fn exported_name(specifier: &str) -> Option<&str> {
    let specifier = specifier.trim();
    if specifier.starts_with("type ") {
        return None;
    }
    let name = specifier.split_whitespace().next()?;
    Some(name).filter(|name| !name.is_empty())
}
