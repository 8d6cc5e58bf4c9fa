//! Activation precondition: the workspace must use the UI library.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::ScanError;

pub const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    name: Option<String>,
    #[serde(default)]
    dependencies: HashMap<String, Value>,
    #[serde(default)]
    dev_dependencies: HashMap<String, Value>,
}

/// Checks whether the project at `root` is the library itself or depends on it
/// directly (runtime or dev dependency).
pub async fn declares_library(root: &Path, library: &str) -> Result<bool, ScanError> {
    let path = root.join(MANIFEST_FILE);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ScanError::Read { path: path.clone(), source })?;

    let manifest: PackageManifest = serde_json::from_str(&text).map_err(|e| ScanError::Manifest {
        path: path.clone(),
        message: e.to_string(),
    })?;

    let declared = manifest.name.as_deref() == Some(library)
        || manifest.dependencies.contains_key(library)
        || manifest.dev_dependencies.contains_key(library);

    debug!("{:?} declares {}: {}", path, library, declared);
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_manifest(contents: &str) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        tokio::fs::write(temp_dir.path().join(MANIFEST_FILE), contents).await.unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_dependency_and_dev_dependency() {
        let dir = write_manifest(r#"{ "name": "app", "dependencies": { "svelte-ui": "^1.0.0" } }"#).await;
        assert!(declares_library(dir.path(), "svelte-ui").await.unwrap());

        let dir = write_manifest(r#"{ "devDependencies": { "svelte-ui": "workspace:*" } }"#).await;
        assert!(declares_library(dir.path(), "svelte-ui").await.unwrap());
    }

    #[tokio::test]
    async fn test_library_itself() {
        let dir = write_manifest(r#"{ "name": "svelte-ui", "version": "2.0.0" }"#).await;
        assert!(declares_library(dir.path(), "svelte-ui").await.unwrap());
    }

    #[tokio::test]
    async fn test_unrelated_project() {
        let dir = write_manifest(r#"{ "name": "app", "peerDependencies": { "svelte-ui": "*" } }"#).await;
        assert!(!declares_library(dir.path(), "svelte-ui").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_or_invalid_manifest() {
        let empty = TempDir::new().unwrap();
        assert!(matches!(
            declares_library(empty.path(), "svelte-ui").await,
            Err(ScanError::Read { .. })
        ));

        let dir = write_manifest("{ not json").await;
        assert!(matches!(
            declares_library(dir.path(), "svelte-ui").await,
            Err(ScanError::Manifest { .. })
        ));
    }
}
