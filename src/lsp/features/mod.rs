//! LSP features built on top of the variable index.

pub mod completion;
