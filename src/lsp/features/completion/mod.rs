//! CSS variable completion
//!
//! This module provides:
//! - Trigger detection from the text before the cursor (`var(--`, attribute `--`, bare `--`)
//! - Import resolution for component-scoped variables
//! - Filtering of the variable table and formatting into LSP completion items

pub mod context;
pub mod imports;
pub mod resolver;

pub use context::{TriggerKind, detect_trigger, line_prefix};
pub use imports::ImportSet;
pub use resolver::{completion_item, eligible_variables, is_eligible, provide_completions};
