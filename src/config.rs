//! Server settings
//!
//! Settings arrive from the client as `initializationOptions` and again on every
//! `workspace/didChangeConfiguration`. Either payload may hold the settings
//! object directly or nest it under the `cssVariables` key.

use serde::Deserialize;
use serde_json::Value;

/// UI library scanned when neither the command line nor the client names one.
pub const DEFAULT_LIBRARY: &str = "svelte-ui";

/// Placeholder substituted with the configured library name in glob patterns.
pub const LIBRARY_PLACEHOLDER: &str = "<library>";

/// Key under which clients usually nest the settings object.
pub const SETTINGS_SECTION: &str = "cssVariables";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    library: Option<String>,
    css_files: Option<Vec<String>>,
    svelte_files: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    enable_logging: Option<bool>,
}

/// Effective configuration of the indexing engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Package name of the UI library.
    pub library: String,
    /// Stylesheet search patterns, relative to the workspace root.
    pub css_files: Vec<String>,
    /// Component search patterns, relative to the workspace root.
    pub svelte_files: Vec<String>,
    /// Exclusion patterns applied to both searches.
    pub exclude: Vec<String>,
    /// Mirror scan diagnostics to the client log.
    pub enable_logging: bool,
}

impl Settings {
    pub fn new(library: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            css_files: vec![
                "**/*.css".to_string(),
                format!("node_modules/{}/**/*.css", LIBRARY_PLACEHOLDER),
            ],
            svelte_files: vec![format!("node_modules/{}/**/*.svelte", LIBRARY_PLACEHOLDER)],
            exclude: vec![
                "**/node_modules/**".to_string(),
                "**/.svelte-kit/**".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
                "**/.git/**".to_string(),
            ],
            enable_logging: false,
        }
    }

    /// Parses a client settings payload, filling every missing key from the defaults.
    pub fn from_value(value: &Value, default_library: &str) -> Result<Self, serde_json::Error> {
        let section = value.get(SETTINGS_SECTION).unwrap_or(value);
        let raw = if section.is_null() {
            RawSettings::default()
        } else {
            RawSettings::deserialize(section)?
        };

        let mut settings = Settings::new(raw.library.unwrap_or_else(|| default_library.to_string()));
        if let Some(css_files) = raw.css_files {
            settings.css_files = css_files;
        }
        if let Some(svelte_files) = raw.svelte_files {
            settings.svelte_files = svelte_files;
        }
        if let Some(exclude) = raw.exclude {
            settings.exclude = exclude;
        }
        if let Some(enable_logging) = raw.enable_logging {
            settings.enable_logging = enable_logging;
        }
        Ok(settings)
    }

    pub fn stylesheet_patterns(&self) -> Vec<String> {
        self.expand(&self.css_files)
    }

    pub fn component_patterns(&self) -> Vec<String> {
        self.expand(&self.svelte_files)
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.expand(&self.exclude)
    }

    /// Library stylesheets, scanned even when the exclusions would hide them.
    pub fn important_stylesheet_patterns(&self) -> Vec<String> {
        vec![format!("node_modules/{}/**/*.css", self.library)]
    }

    /// Library components, scanned even when the exclusions would hide them.
    pub fn important_component_patterns(&self) -> Vec<String> {
        vec![format!("node_modules/{}/**/*.svelte", self.library)]
    }

    fn expand(&self, patterns: &[String]) -> Vec<String> {
        patterns
            .iter()
            .map(|pattern| pattern.replace(LIBRARY_PLACEHOLDER, &self.library))
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_LIBRARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_substitute_library() {
        let settings = Settings::new("my-ui");
        assert_eq!(
            settings.stylesheet_patterns(),
            vec!["**/*.css".to_string(), "node_modules/my-ui/**/*.css".to_string()]
        );
        assert_eq!(settings.component_patterns(), vec!["node_modules/my-ui/**/*.svelte".to_string()]);
        assert!(!settings.enable_logging);
    }

    #[test]
    fn test_from_value_nested_section() {
        let value = json!({
            "cssVariables": {
                "cssFiles": ["src/**/*.css"],
                "enableLogging": true
            }
        });
        let settings = Settings::from_value(&value, "fallback-ui").unwrap();
        assert_eq!(settings.library, "fallback-ui");
        assert_eq!(settings.css_files, vec!["src/**/*.css".to_string()]);
        assert!(settings.enable_logging);
        // Untouched keys keep their defaults
        assert_eq!(settings.exclude, Settings::new("fallback-ui").exclude);
    }

    #[test]
    fn test_from_value_flat_and_null() {
        let settings = Settings::from_value(&json!({ "library": "other-ui" }), "x").unwrap();
        assert_eq!(settings.library, "other-ui");

        let settings = Settings::from_value(&Value::Null, "x").unwrap();
        assert_eq!(settings, Settings::new("x"));
    }

    #[test]
    fn test_from_value_rejects_wrong_types() {
        assert!(Settings::from_value(&json!({ "cssFiles": "not-a-list" }), "x").is_err());
    }
}
