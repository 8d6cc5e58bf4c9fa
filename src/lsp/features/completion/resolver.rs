//! Completion resolver
//!
//! Turns a variable table snapshot plus the current document into completion
//! items. Pure: nothing here mutates the table or the document.

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemLabelDetails, Documentation,
    MarkupContent, MarkupKind,
};
use tracing::trace;

use crate::index::{Origin, Variable, VariableTable};

use super::context::{TriggerKind, detect_trigger, line_prefix};
use super::imports::ImportSet;

/// Whether `variable` may be suggested in a document importing `imports`.
pub fn is_eligible(variable: &Variable, imports: &ImportSet) -> bool {
    match &variable.origin {
        Origin::Global => true,
        Origin::Component(component) => imports.contains(component),
    }
}

/// Variables visible in a document importing `imports`, sorted by name.
pub fn eligible_variables<'a>(table: &'a VariableTable, imports: &ImportSet) -> Vec<&'a Variable> {
    let mut visible: Vec<&Variable> = table
        .iter()
        .filter(|variable| is_eligible(variable, imports))
        .collect();
    visible.sort_by(|a, b| a.name.cmp(&b.name));
    visible
}

/// Completions for the cursor at (`line`, `character`) in `text`.
///
/// Returns an empty list when the cursor is not at a trigger position.
pub fn provide_completions(
    table: &VariableTable,
    text: &str,
    line: u32,
    character: u32,
    library: &str,
) -> Vec<CompletionItem> {
    let Some(prefix) = line_prefix(text, line, character) else {
        return Vec::new();
    };
    let Some(trigger) = detect_trigger(prefix) else {
        trace!("No completion trigger at {}:{}", line, character);
        return Vec::new();
    };

    let imports = ImportSet::from_document(text, library);
    trace!("Trigger {:?} with {} imported components", trigger, imports.len());

    eligible_variables(table, &imports)
        .into_iter()
        .map(|variable| completion_item(variable, trigger))
        .collect()
}

/// Formats one variable as a ready-to-insert completion.
pub fn completion_item(variable: &Variable, trigger: TriggerKind) -> CompletionItem {
    let source = variable.source_file.display().to_string();

    let origin = match &variable.origin {
        Origin::Global => "Global CSS variable".to_string(),
        Origin::Component(component) => format!("CSS variable of <{}>", component),
    };
    let detail = match &variable.value {
        Some(value) => format!("{} ({}) · {}", origin, value, source),
        None => format!("{} · {}", origin, source),
    };

    let attribution = format!("Defined in `{}`", source);
    let documentation = match &variable.description {
        Some(description) => format!("{}\n\n{}", description, attribution),
        None => attribution,
    };

    CompletionItem {
        label: variable.name.clone(),
        label_details: variable.component_name().map(|component| CompletionItemLabelDetails {
            detail: None,
            description: Some(component.to_string()),
        }),
        kind: Some(CompletionItemKind::VARIABLE),
        detail: Some(detail),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: documentation,
        })),
        insert_text: Some(trigger.insert_text(&variable.name)),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn variable(name: &str, origin: Origin, description: Option<&str>) -> Variable {
        Variable {
            name: name.to_string(),
            description: description.map(str::to_string),
            value: None,
            origin,
            source_file: PathBuf::from("src/theme.css"),
        }
    }

    fn table() -> VariableTable {
        [
            variable("--brand", Origin::Global, Some("Brand color")),
            variable("--btn-size", Origin::Component("Button".to_string()), Some("Controls button size")),
            variable("--card-pad", Origin::Component("Card".to_string()), None),
        ]
        .into_iter()
        .collect()
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_component_variables_need_import() {
        let table = table();
        let without = provide_completions(&table, "color: var(--", 0, 13, "svelte-ui");
        assert_eq!(labels(&without), vec!["--brand"]);

        let text = "<script>import { Button } from 'svelte-ui';</script>\n<div style=\"color: var(--";
        let with = provide_completions(&table, text, 1, 25, "svelte-ui");
        assert_eq!(labels(&with), vec!["--brand", "--btn-size"]);
    }

    #[test]
    fn test_no_trigger_returns_empty() {
        assert!(provide_completions(&table(), "margin: 1px", 0, 11, "svelte-ui").is_empty());
        assert!(provide_completions(&table(), "--", 5, 0, "svelte-ui").is_empty());
    }

    #[test]
    fn test_insert_text_per_trigger() {
        let table = table();
        let insert = |text: &str| {
            let items = provide_completions(&table, text, 0, text.encode_utf16().count() as u32, "svelte-ui");
            items[0].insert_text.clone().unwrap()
        };
        assert_eq!(insert("color: var(--"), "brand)");
        assert_eq!(insert("  --"), "brand");
        assert_eq!(insert("--"), "--brand");
    }

    #[test]
    fn test_completion_item_formatting() {
        let item = completion_item(
            &variable("--btn-size", Origin::Component("Button".to_string()), Some("Controls button size")),
            TriggerKind::Direct,
        );
        assert_eq!(item.label, "--btn-size");
        assert_eq!(item.kind, Some(CompletionItemKind::VARIABLE));
        assert_eq!(item.detail.as_deref(), Some("CSS variable of <Button> · src/theme.css"));
        assert_eq!(
            item.documentation,
            Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: "Controls button size\n\nDefined in `src/theme.css`".to_string(),
            }))
        );
        assert_eq!(item.label_details.unwrap().description.as_deref(), Some("Button"));
    }

    #[test]
    fn test_global_item_without_description() {
        let mut brand = variable("--brand", Origin::Global, None);
        brand.value = Some("#123".to_string());
        let item = completion_item(&brand, TriggerKind::VarCall);

        assert_eq!(item.detail.as_deref(), Some("Global CSS variable (#123) · src/theme.css"));
        assert!(item.label_details.is_none());
        match item.documentation {
            Some(Documentation::MarkupContent(content)) => {
                assert_eq!(content.value, "Defined in `src/theme.css`")
            }
            other => panic!("unexpected documentation: {:?}", other),
        }
    }
}
