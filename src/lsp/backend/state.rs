//! Backend state management
//!
//! This module defines the CssVariablesBackend struct, which maintains all state
//! for the LSP server: open documents, settings, the variable index, and the
//! channels feeding the background rescan task.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32};

use notify::RecommendedWatcher;
use parking_lot::Mutex;
use tokio::sync::{RwLock, broadcast, mpsc};
use tower_lsp::Client;
use tower_lsp::lsp_types::Url;

use crate::config::Settings;
use crate::index::SymbolIndex;
use crate::lsp::models::LspDocument;

/// Reason a rescan was requested through the debounced channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RescanTrigger {
    /// A watched stylesheet or component was created, modified, or deleted.
    FileChanged(PathBuf),
}

/// The CSS variables language server backend, managing state and handling LSP requests.
#[derive(Clone)]
pub struct CssVariablesBackend {
    pub(super) client: Client,
    pub(super) documents_by_uri: Arc<RwLock<HashMap<Url, Arc<LspDocument>>>>,
    pub(super) serial_document_id: Arc<AtomicU32>,
    pub(super) index: Arc<SymbolIndex>,
    pub(super) settings: Arc<RwLock<Settings>>,
    /// Library used when the client settings do not name one
    pub(super) default_library: Arc<str>,
    pub(super) root_dir: Arc<RwLock<Option<PathBuf>>>,
    /// Set once the workspace manifest declares the UI library
    pub(super) active: Arc<AtomicBool>,
    pub(super) rescan_tx: mpsc::UnboundedSender<RescanTrigger>,
    pub(super) file_watcher: Arc<Mutex<Option<RecommendedWatcher>>>,
    pub(super) shutdown_tx: Arc<broadcast::Sender<()>>,
}

// Manual Debug implementation since Client and the watcher don't carry useful Debug output
impl std::fmt::Debug for CssVariablesBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssVariablesBackend")
            .field("default_library", &self.default_library)
            .field("variables", &self.index.snapshot().len())
            .field("active", &self.active)
            .finish()
    }
}
