use ropey::Rope;

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent};

pub use crate::lsp::models::{LspDocument, LspDocumentState};

/// Converts an LSP position (UTF-16 columns) to a char index in the Rope.
///
/// Positions past the end of a line or of the document are clamped.
fn position_to_char_index(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }

    let line_start = text.line_to_char(line);
    let line_end = if line + 1 < text.len_lines() {
        text.line_to_char(line + 1)
    } else {
        text.len_chars()
    };

    let line_start_units = text.char_to_utf16_cu(line_start);
    let line_end_units = text.char_to_utf16_cu(line_end);
    let target = (line_start_units + position.character as usize).min(line_end_units);
    text.utf16_cu_to_char(target)
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state.
    /// Returns the updated text if the version is newer, otherwise an error.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Result<String, String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_index(&range.start, &self.text);
                let end = position_to_char_index(&range.end, &self.text).max(start);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(self.text.to_string())
    }
}

impl LspDocument {
    pub fn new(id: u32, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState {
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Applies changes to the document, returning the new text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32,
    ) -> Option<String> {
        let mut state = self.state.write().await;
        state.apply(changes, version).ok()
    }
}
