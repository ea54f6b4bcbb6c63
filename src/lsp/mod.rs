//! Language Server Protocol implementation for CC: Tweaked Lua scripts.
//!
//! This module provides LSP support with features like:
//! - Completion: Globals, modules and module members from the API catalog
//! - Hover: Signature and documentation for the symbol under the cursor

pub mod completion;
pub mod documents;
pub mod hover;
pub mod lexical;
pub mod symbol_index;

#[cfg(test)]
mod fixtures;
mod server;
mod tracing_layer;

pub use server::{ServeOptions, load_catalog, serve};
