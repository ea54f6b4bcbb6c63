//! Error types for catalog loading.

use std::path::PathBuf;

use derive_more::{Display, Error, From};

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while loading a catalog.
#[derive(Debug, Display, Error, From)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[from(ignore)]
    #[display("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The catalog is not well-formed JSON or does not match the schema.
    #[display("failed to parse catalog: {_0}")]
    Parse(#[error(source)] serde_json::Error),

    /// The catalog parsed but violates a structural rule.
    #[display("invalid catalog: {_0}")]
    Invalid(InvalidCatalog),
}

/// Structural problems detected by [`crate::Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum InvalidCatalog {
    #[display("module #{index} has an empty name")]
    EmptyModuleName { index: usize },
    #[display("function #{index} in {owner} has an empty name")]
    EmptyFunctionName {
        #[error(not(source))]
        owner: String,
        index: usize,
    },
    #[display("name `{name}` must not contain `.`")]
    DottedName {
        #[error(not(source))]
        name: String,
    },
    #[display("module `{name}` is declared more than once")]
    DuplicateModule {
        #[error(not(source))]
        name: String,
    },
    #[display("module `{name}` has the same name as a global function")]
    ModuleShadowsGlobal {
        #[error(not(source))]
        name: String,
    },
}
