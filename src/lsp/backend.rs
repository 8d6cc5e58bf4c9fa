use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;
use tokio::sync::{RwLock, broadcast, mpsc};
use tower_lsp::Client;
use tower_lsp::lsp_types::MessageType;
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::RescanError;
use crate::index::manifest::declares_library;
use crate::index::{ScanConfig, ScanReport, SymbolIndex, VariableTable};

// Import types from backend submodules
mod handlers;
mod state;
mod watcher;

pub use state::CssVariablesBackend;
pub use watcher::is_watched_file;

/// `workspace/executeCommand` id of the manual rescan.
pub const RESCAN_COMMAND: &str = "cssVariables.rescan";

impl CssVariablesBackend {
    /// Creates a new backend for the given client.
    ///
    /// `default_library` names the UI library until the client settings say otherwise.
    pub fn new(client: Client, default_library: impl Into<String>) -> Self {
        let default_library: String = default_library.into();
        let (rescan_tx, rescan_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let backend = Self {
            client,
            documents_by_uri: Arc::new(RwLock::new(HashMap::new())),
            serial_document_id: Arc::new(AtomicU32::new(0)),
            index: Arc::new(SymbolIndex::new()),
            settings: Arc::new(RwLock::new(Settings::new(default_library.clone()))),
            default_library: Arc::from(default_library),
            root_dir: Arc::new(RwLock::new(None)),
            active: Arc::new(AtomicBool::new(false)),
            rescan_tx,
            file_watcher: Arc::new(Mutex::new(None)),
            shutdown_tx: Arc::new(shutdown_tx),
        };

        Self::spawn_rescan_debouncer(backend.clone(), rescan_rx);

        backend
    }

    /// The current variable table.
    pub fn snapshot(&self) -> Arc<VariableTable> {
        self.index.snapshot()
    }

    /// Whether the workspace passed the activation check.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Re-evaluates the activation precondition for `root`.
    ///
    /// A manifest that cannot be read or parsed is logged and leaves the server inactive.
    pub(super) async fn refresh_activation(&self, root: &Path) -> bool {
        let library = self.settings.read().await.library.clone();
        let active = match declares_library(root, &library).await {
            Ok(true) => {
                info!("Workspace {:?} uses {}, enabling CSS variable completions", root, library);
                true
            }
            Ok(false) => {
                info!("Workspace {:?} does not depend on {}, staying inactive", root, library);
                false
            }
            Err(e) => {
                error!("Activation aborted: {}", e);
                false
            }
        };

        let was_active = self.active.swap(active, Ordering::SeqCst);
        if was_active && !active {
            self.index.clear();
            *self.file_watcher.lock() = None;
        }
        active
    }

    /// Rebuilds the variable index from the workspace.
    ///
    /// On error the previous table stays current and the error names why no rebuild happened.
    pub async fn rescan(&self) -> Result<ScanReport, RescanError> {
        let settings = self.settings.read().await.clone();
        if !self.is_active() {
            debug!("Skipping rescan: server inactive");
            return Err(RescanError::Inactive { library: settings.library });
        }
        let root = self.root_dir.read().await.clone().ok_or(RescanError::NoWorkspaceRoot)?;

        let config = match ScanConfig::new(root, &settings) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid scan configuration: {}", e);
                self.log_to_client(&settings, MessageType::ERROR, format!("Invalid scan configuration: {}", e))
                    .await;
                return Err(RescanError::InvalidConfiguration(e));
            }
        };

        let report = self.index.rebuild(&config).await.map_err(|e| {
            error!("Rebuild failed: {}", e);
            RescanError::RebuildFailed(e)
        })?;

        for failure in &report.failures {
            self.log_to_client(
                &settings,
                MessageType::WARNING,
                format!("Skipped {}: {}", failure.path.display(), failure.message),
            )
            .await;
        }
        self.log_to_client(
            &settings,
            MessageType::INFO,
            format!(
                "Indexed {} CSS variables from {} files",
                report.variables, report.files_scanned
            ),
        )
        .await;
        Ok(report)
    }

    /// Mirrors a diagnostic line to the client log when the logging toggle is on.
    async fn log_to_client(&self, settings: &Settings, level: MessageType, message: String) {
        if settings.enable_logging {
            self.client.log_message(level, message).await;
        }
    }

    /// Applies a new settings payload, re-checking activation if the library changed.
    pub(super) async fn update_settings(&self, settings: Settings) {
        let library_changed = {
            let mut current = self.settings.write().await;
            let changed = current.library != settings.library;
            *current = settings;
            changed
        };

        let root = self.root_dir.read().await.clone();
        if let (true, Some(root)) = (library_changed, root) {
            if self.refresh_activation(&root).await {
                let watching = self.file_watcher.lock().is_some();
                if !watching {
                    if let Err(e) = self.start_file_watcher(&root) {
                        warn!("Failed to start file watcher for {:?}: {}", root, e);
                    }
                }
            }
        }

        if let Err(e) = self.rescan().await {
            debug!("Configuration change left the index unchanged: {}", e);
        }
    }

    /// Generates the next unique document ID.
    pub(super) fn next_document_id(&self) -> u32 {
        self.serial_document_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(super) async fn set_root(&self, root: PathBuf) {
        *self.root_dir.write().await = Some(root);
    }
}
