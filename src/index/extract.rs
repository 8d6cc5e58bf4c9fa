//! Extraction rules
//!
//! Each rule is a pure function from file text to the declarations it
//! recognises. The rules are deliberately pattern-based: partial or unusual
//! input yields fewer declarations, never an error.
//!
//! - [`property_declarations`]: `@property --name { ... }` rules, optionally
//!   preceded by a doc comment
//! - [`plain_declarations`]: `--name: value;` pairs, optionally preceded by a
//!   comment
//! - [`component_tags`]: `@cssprop --name - description` tags in components

use once_cell::sync::Lazy;
use regex::Regex;

/// Comment body that cannot run past the first `*/`.
macro_rules! comment_block {
    () => {
        r"/\*(?P<comment>(?:[^*]|\*+[^*/])*)\*+/"
    };
}

static PROPERTY_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:",
        comment_block!(),
        r"\s*)?@property\s+(?P<name>--[\w-]+)\s*\{(?P<body>[^}]*)\}"
    ))
    .expect("property rule pattern is valid")
});

static PLAIN_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:",
        comment_block!(),
        r"\s*)?(?P<name>--[\w-]+)\s*:\s*(?P<value>[^;{}]+)(?:;|\})"
    ))
    .expect("plain declaration pattern is valid")
});

static TAG_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)@cssprop[ \t]+(?P<name>--[\w-]+)[ \t]+-[ \t]*(?P<description>.+)$")
        .expect("documentation tag pattern is valid")
});

static SYNTAX_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"syntax\s*:\s*['"](?P<value>[^'"]*)['"]"#).expect("syntax field pattern is valid")
});

static INHERITS_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"inherits\s*:\s*(?P<value>true|false)").expect("inherits field pattern is valid")
});

static INITIAL_VALUE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"initial-value\s*:\s*(?P<value>[^;]+)").expect("initial-value field pattern is valid")
});

/// A custom property recognised by one of the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub description: Option<String>,
    pub value: Option<String>,
}

/// Metadata fields of an `@property` body. Each is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub syntax: Option<String>,
    pub inherits: Option<bool>,
    pub initial_value: Option<String>,
}

impl PropertyMetadata {
    pub fn parse(body: &str) -> Self {
        let field = |pattern: &Regex| {
            pattern
                .captures(body)
                .map(|captures| captures["value"].trim().to_string())
        };

        Self {
            syntax: field(&SYNTAX_FIELD),
            inherits: field(&INHERITS_FIELD).map(|value| value == "true"),
            initial_value: field(&INITIAL_VALUE_FIELD),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.syntax.is_none() && self.inherits.is_none() && self.initial_value.is_none()
    }

    /// Renders the present fields as a fenced `css` block.
    pub fn to_markdown(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut block = String::from("```css\n");
        if let Some(syntax) = &self.syntax {
            block.push_str(&format!("syntax: '{}'\n", syntax));
        }
        if let Some(inherits) = self.inherits {
            block.push_str(&format!("inherits: {}\n", inherits));
        }
        if let Some(initial_value) = &self.initial_value {
            block.push_str(&format!("initial-value: {}\n", initial_value));
        }
        block.push_str("```");
        Some(block)
    }
}

/// Extracts `@property` rules together with their doc comments.
pub fn property_declarations(text: &str) -> Vec<Declaration> {
    PROPERTY_RULE
        .captures_iter(text)
        .map(|captures| {
            let comment = captures.name("comment").and_then(|m| clean_comment(m.as_str()));
            let metadata = PropertyMetadata::parse(&captures["body"]);

            let description = match (comment, metadata.to_markdown()) {
                (Some(comment), Some(block)) => Some(format!("{}\n\n{}", comment, block)),
                (comment, block) => comment.or(block),
            };

            Declaration {
                name: captures["name"].to_string(),
                description,
                value: metadata.initial_value,
            }
        })
        .collect()
}

/// Extracts `--name: value;` declarations and any comment directly before them.
pub fn plain_declarations(text: &str) -> Vec<Declaration> {
    PLAIN_RULE
        .captures_iter(text)
        .map(|captures| Declaration {
            name: captures["name"].to_string(),
            description: captures.name("comment").and_then(|m| clean_comment(m.as_str())),
            value: Some(captures["value"].trim().to_string()).filter(|value| !value.is_empty()),
        })
        .collect()
}

/// Extracts `@cssprop --name - description` documentation tags.
pub fn component_tags(text: &str) -> Vec<Declaration> {
    TAG_RULE
        .captures_iter(text)
        .map(|captures| Declaration {
            name: captures["name"].to_string(),
            description: clean_tag_description(&captures["description"]),
            value: None,
        })
        .collect()
}

/// Strips comment decoration (leading `*` on each line) and blank edge lines.
fn clean_comment(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .collect();

    let start = lines.iter().position(|line| !line.is_empty())?;
    let end = lines.iter().rposition(|line| !line.is_empty())?;
    Some(lines[start..=end].join("\n"))
}

fn clean_tag_description(raw: &str) -> Option<String> {
    let mut description = raw.trim();
    for terminator in ["-->", "*/"] {
        if let Some(stripped) = description.strip_suffix(terminator) {
            description = stripped.trim_end();
        }
    }
    Some(description.to_string()).filter(|d| !d.is_empty())
}
