//! Trigger detection for variable completion
//!
//! Completions are offered only when the text between the start of the line
//! and the cursor ends in one of three shapes:
//! 1. `var(--`: a `var()` call whose argument has just started
//! 2. `<whitespace>--`: an attribute position, e.g. `<Button --btn-size=...`
//! 3. `--`: anything else ending in a double dash

use once_cell::sync::Lazy;
use regex::Regex;

static VAR_CALL_TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\(\s*--$").expect("var() trigger pattern is valid"));

static ATTRIBUTE_TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s--$").expect("attribute trigger pattern is valid"));

/// Which trigger shape opened the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Inside `var(`; the inserted name also closes the call.
    VarCall,
    /// Whitespace before the dashes; the dashes are already typed.
    Attribute,
    /// Bare double dash; the full name is inserted.
    Direct,
}

impl TriggerKind {
    /// Text to insert for the variable `name` (which includes its leading `--`).
    pub fn insert_text(self, name: &str) -> String {
        let bare = name.strip_prefix("--").unwrap_or(name);
        match self {
            TriggerKind::VarCall => format!("{})", bare),
            TriggerKind::Attribute => bare.to_string(),
            TriggerKind::Direct => name.to_string(),
        }
    }
}

/// Classifies the text before the cursor. `None` means no completions here.
pub fn detect_trigger(prefix: &str) -> Option<TriggerKind> {
    if VAR_CALL_TRIGGER.is_match(prefix) {
        Some(TriggerKind::VarCall)
    } else if ATTRIBUTE_TRIGGER.is_match(prefix) {
        Some(TriggerKind::Attribute)
    } else if prefix.ends_with("--") {
        Some(TriggerKind::Direct)
    } else {
        None
    }
}

/// Text of line `line` from its start up to `character` (UTF-16 code units).
///
/// Columns past the end of the line are clamped; a line past the end of the
/// text yields `None`.
pub fn line_prefix(text: &str, line: u32, character: u32) -> Option<&str> {
    let line_text = text.split('\n').nth(line as usize)?;
    let line_text = line_text.strip_suffix('\r').unwrap_or(line_text);

    let mut units = 0u32;
    for (offset, ch) in line_text.char_indices() {
        if units >= character {
            return Some(&line_text[..offset]);
        }
        units += ch.len_utf16() as u32;
    }
    Some(line_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_trigger() {
        assert_eq!(detect_trigger("color: var(--"), Some(TriggerKind::VarCall));
        assert_eq!(detect_trigger("color: var( --"), Some(TriggerKind::VarCall));
        assert_eq!(detect_trigger("--"), Some(TriggerKind::Direct));
        assert_eq!(detect_trigger("color:--"), Some(TriggerKind::Direct));
        assert_eq!(detect_trigger("  --"), Some(TriggerKind::Attribute));
        assert_eq!(detect_trigger("<Button --"), Some(TriggerKind::Attribute));
        assert_eq!(detect_trigger("margin: 1px"), None);
        assert_eq!(detect_trigger("color: var(-"), None);
        assert_eq!(detect_trigger(""), None);
    }

    #[test]
    fn test_insert_text() {
        assert_eq!(TriggerKind::VarCall.insert_text("--foo-bar"), "foo-bar)");
        assert_eq!(TriggerKind::Attribute.insert_text("--foo-bar"), "foo-bar");
        assert_eq!(TriggerKind::Direct.insert_text("--foo-bar"), "--foo-bar");
    }

    #[test]
    fn test_line_prefix() {
        let text = "a {\r\n  color: var(--x);\n}";
        assert_eq!(line_prefix(text, 0, 3), Some("a {"));
        assert_eq!(line_prefix(text, 1, 15), Some("  color: var(--"));
        assert_eq!(line_prefix(text, 1, 100), Some("  color: var(--x);"));
        assert_eq!(line_prefix(text, 3, 0), None);
    }

    #[test]
    fn test_line_prefix_counts_utf16_units() {
        // U+1F3A8 takes two UTF-16 code units
        let text = "/* 🎨 */ --";
        assert_eq!(line_prefix(text, 0, 11), Some("/* 🎨 */ --"));
        assert_eq!(line_prefix(text, 0, 5), Some("/* 🎨"));
    }
}
