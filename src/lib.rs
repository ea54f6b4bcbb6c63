//! Completion and hover for the CC: Tweaked Lua API.

pub mod lsp;

pub use tweaked_catalog as catalog;
