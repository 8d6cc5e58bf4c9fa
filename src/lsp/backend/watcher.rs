//! File watching and debounced rescans
//!
//! One recursive watcher covers the whole workspace; every create, modify, or
//! delete of a stylesheet or component feeds the rescan channel. The
//! debouncer waits for a quiet period before running a single rebuild.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Duration, sleep};
use tracing::{debug, info, trace, warn};

use super::state::{CssVariablesBackend, RescanTrigger};

const DEBOUNCE_DURATION: Duration = Duration::from_millis(300);

/// Extensions whose changes trigger a rescan.
const WATCHED_EXTENSIONS: [&str; 2] = ["css", "svelte"];

/// Whether a change to `path` should trigger a rescan.
pub fn is_watched_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
}

fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

impl CssVariablesBackend {
    /// Starts watching `root` recursively. Replaces any previous watcher.
    pub(super) fn start_file_watcher(&self, root: &Path) -> notify::Result<()> {
        let tx = self.rescan_tx.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<notify::Event>| match result {
                Ok(event) => {
                    if !is_content_change(&event.kind) {
                        return;
                    }
                    for path in event.paths.into_iter().filter(|path| is_watched_file(path)) {
                        let _ = tx.send(RescanTrigger::FileChanged(path));
                    }
                }
                Err(e) => warn!("File watcher error: {}", e),
            },
            notify::Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        *self.file_watcher.lock() = Some(watcher);
        info!("Watching {:?} for stylesheet and component changes", root);
        Ok(())
    }

    /// Queues a rescan for a change reported by the client.
    pub(super) fn queue_file_change(&self, path: PathBuf) {
        if is_watched_file(&path) {
            let _ = self.rescan_tx.send(RescanTrigger::FileChanged(path));
        }
    }

    /// Spawns the task that collapses bursts of file changes into one rebuild.
    pub(super) fn spawn_rescan_debouncer(
        backend: CssVariablesBackend,
        mut rescan_rx: mpsc::UnboundedReceiver<RescanTrigger>,
    ) {
        let mut shutdown_rx = backend.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut pending: HashSet<PathBuf> = HashSet::new();

            loop {
                tokio::select! {
                    Some(trigger) = rescan_rx.recv() => {
                        let RescanTrigger::FileChanged(path) = trigger;
                        trace!("Queued change: {:?}", path);
                        pending.insert(path);
                    }
                    _ = sleep(DEBOUNCE_DURATION), if !pending.is_empty() => {
                        info!("Rescanning after {} file changes", pending.len());
                        pending.clear();
                        if let Err(e) = backend.rescan().await {
                            debug!("Debounced rescan skipped: {}", e);
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Rescan debouncer received shutdown signal, exiting gracefully");
                        break;
                    }
                }
            }
            debug!("Rescan debouncer task terminated");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, MetadataKind, RemoveKind};
    use tower_lsp::LspService;

    #[test]
    fn test_is_watched_file() {
        assert!(is_watched_file(Path::new("/ws/src/app.css")));
        assert!(is_watched_file(Path::new("/ws/node_modules/ui/Button.svelte")));
        assert!(!is_watched_file(Path::new("/ws/src/app.scss")));
        assert!(!is_watched_file(Path::new("/ws/Makefile")));
    }

    #[test]
    fn test_content_changes_only() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Remove(RemoveKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_content_change(&EventKind::Any));
    }

    #[tokio::test]
    async fn test_queue_file_change_filters_extensions() {
        let (service, _socket) = LspService::new(|client| CssVariablesBackend::new(client, "svelte-ui"));
        let mut backend = service.inner().clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        backend.rescan_tx = tx;

        backend.queue_file_change(PathBuf::from("/ws/src/theme.scss"));
        assert!(rx.try_recv().is_err(), "non-css changes are ignored");

        backend.queue_file_change(PathBuf::from("/ws/src/theme.css"));
        assert_eq!(
            rx.try_recv().ok(),
            Some(RescanTrigger::FileChanged(PathBuf::from("/ws/src/theme.css")))
        );
    }
}
