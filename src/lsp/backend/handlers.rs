//! LSP protocol handler implementations
//!
//! This module contains the `tower_lsp::LanguageServer` trait implementation
//! for the CSS variables backend:
//! - Lifecycle handlers (initialize, initialized, shutdown)
//! - Document lifecycle (did_open, did_change, did_close)
//! - Workspace notifications (configuration and watched file changes)
//! - The rescan command and completion

use std::path::PathBuf;
use std::sync::Arc;

use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionOptionsCompletionItem, CompletionParams, CompletionResponse,
    DidChangeConfigurationParams, DidChangeTextDocumentParams, DidChangeWatchedFilesParams,
    DidCloseTextDocumentParams, DidOpenTextDocumentParams, ExecuteCommandOptions,
    ExecuteCommandParams, InitializeParams, InitializeResult, InitializedParams, MessageType,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
};
use tower_lsp::{LanguageServer, jsonrpc};
use tracing::{debug, error, info, warn};

use crate::config::Settings;
use crate::error::RescanError;
use crate::index::ScanReport;
use crate::lsp::features::completion::provide_completions;
use crate::lsp::models::LspDocument;

use super::RESCAN_COMMAND;
use super::state::CssVariablesBackend;

/// Picks the workspace root: `rootUri` first, then the first workspace folder.
#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    params
        .root_uri
        .as_ref()
        .and_then(|uri| uri.to_file_path().ok())
        .or_else(|| {
            params
                .workspace_folders
                .as_ref()
                .and_then(|folders| folders.first())
                .and_then(|folder| folder.uri.to_file_path().ok())
        })
}

/// User-facing notice for the outcome of the rescan command.
fn rescan_message(outcome: &Result<ScanReport, RescanError>) -> (MessageType, String) {
    match outcome {
        Ok(report) => (
            MessageType::INFO,
            format!(
                "CSS variables rescanned: {} variables from {} files",
                report.variables, report.files_scanned
            ),
        ),
        Err(e) => {
            let level = match e {
                RescanError::Inactive { .. } | RescanError::NoWorkspaceRoot => MessageType::WARNING,
                RescanError::InvalidConfiguration(_) | RescanError::RebuildFailed(_) => MessageType::ERROR,
            };
            (level, format!("CSS variables not rescanned: {}", e))
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for CssVariablesBackend {
    /// Handles the LSP initialize request: reads settings, checks activation, and starts watching.
    async fn initialize(&self, params: InitializeParams) -> jsonrpc::Result<InitializeResult> {
        info!("Received initialize from {:?}", params.client_info.as_ref().map(|c| &c.name));

        if let Some(options) = &params.initialization_options {
            match Settings::from_value(options, &self.default_library) {
                Ok(settings) => *self.settings.write().await = settings,
                Err(e) => warn!("Ignoring invalid initialization options: {}", e),
            }
        }

        match workspace_root(&params) {
            Some(root) => {
                self.set_root(root.clone()).await;
                if self.refresh_activation(&root).await {
                    if let Err(e) = self.start_file_watcher(&root) {
                        error!("Failed to start file watcher for {:?}: {}", root, e);
                        return Err(jsonrpc::Error::internal_error());
                    }
                }
            }
            None => warn!("No workspace root provided, CSS variable completions disabled"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["-".to_string(), "(".to_string()]),
                    all_commit_characters: None,
                    resolve_provider: Some(false),
                    completion_item: Some(CompletionOptionsCompletionItem {
                        label_details_support: Some(true),
                    }),
                    work_done_progress_options: Default::default(),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![RESCAN_COMMAND.to_string()],
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    /// Handles the LSP initialized notification by running the first workspace scan.
    async fn initialized(&self, _params: InitializedParams) {
        info!("Initialized");
        match self.rescan().await {
            Ok(report) => info!(
                "Initial scan indexed {} variables from {} files",
                report.variables, report.files_scanned
            ),
            Err(e) => info!("Initial scan skipped: {}", e),
        }
    }

    /// Handles the LSP shutdown request.
    async fn shutdown(&self) -> jsonrpc::Result<()> {
        info!("Received shutdown request");

        // Signal all background tasks to shut down gracefully
        let _ = self.shutdown_tx.send(());
        *self.file_watcher.lock() = None;
        info!("Shutdown signal sent to all background tasks");

        Ok(())
    }

    /// Handles opening a text document.
    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        info!("Opening document: URI={}, version={}", params.text_document.uri, params.text_document.version);
        let uri = params.text_document.uri;
        let document = Arc::new(LspDocument::new(
            self.next_document_id(),
            &params.text_document.text,
            params.text_document.version,
        ));
        self.documents_by_uri.write().await.insert(uri, document);
    }

    /// Handles changes to a text document, applying incremental updates.
    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("textDocument/didChange: {} v{}", params.text_document.uri, params.text_document.version);
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        let document = self.documents_by_uri.read().await.get(&uri).cloned();
        match document {
            Some(document) => {
                if document.apply(params.content_changes, version).await.is_none() {
                    warn!("Failed to apply changes to document with URI={}", uri);
                }
            }
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    /// Handles closing a text document, removing it from state.
    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents_by_uri.write().await.remove(&uri) {
            Some(document) => info!("Closed document: {}, id: {}", uri, document.id),
            None => warn!("Failed to find document with URI={}", uri),
        }
    }

    /// Handles a settings push from the client and rescans with the new patterns.
    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match Settings::from_value(&params.settings, &self.default_library) {
            Ok(settings) => {
                info!("Configuration changed, library={}", settings.library);
                self.update_settings(settings).await;
            }
            Err(e) => warn!("Ignoring invalid configuration: {}", e),
        }
    }

    /// Feeds client-reported file changes into the debounced rescan channel.
    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            match change.uri.to_file_path() {
                Ok(path) => self.queue_file_change(path),
                Err(()) => debug!("Ignoring non-file change: {}", change.uri),
            }
        }
    }

    /// Runs the manual rescan command and reports the outcome to the user.
    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<serde_json::Value>> {
        if params.command != RESCAN_COMMAND {
            warn!("Unknown command: {}", params.command);
            return Err(jsonrpc::Error::invalid_params(format!("Unknown command: {}", params.command)));
        }

        let (level, message) = rescan_message(&self.rescan().await);
        info!("{}", message);
        self.client.show_message(level, message).await;
        Ok(None)
    }

    /// Provides CSS custom property completions at the cursor.
    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        if !self.is_active() {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        }

        let Some(document) = self.documents_by_uri.read().await.get(&uri).cloned() else {
            warn!("Completion requested for unknown document {}", uri);
            return Ok(None);
        };
        let text = document.text().await;
        let library = self.settings.read().await.library.clone();
        let table = self.index.snapshot();

        let items = provide_completions(&table, &text, position.line, position.character, &library);
        debug!("Returning {} completions for {} at {:?}", items.len(), uri, position);
        Ok(Some(CompletionResponse::Array(items)))
    }
}
