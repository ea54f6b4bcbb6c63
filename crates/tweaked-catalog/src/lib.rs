//! Structured description of the CC: Tweaked Lua API.
//!
//! The catalog lists global functions and modules together with their
//! signatures, parameters, return values and prose documentation. It is
//! loaded once at server startup and then flattened into a symbol index.

mod error;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::{CatalogError, InvalidCatalog, Result};

/// Catalog compiled into the binary.
const EMBEDDED_CATALOG: &str = include_str!("../data/cc-tweaked.json");

/// Top-level catalog document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub globals: Vec<Function>,
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// A named group of functions, e.g. `term` or `turtle`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    /// Free-form classification from the catalog source (`"api"`, `"peripheral"`, ...).
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    /// Extended prose shown after the description.
    #[serde(default)]
    pub documentation: String,
    #[serde(default)]
    pub functions: Vec<Function>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub returns: Vec<Return>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Return {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Catalog {
    /// Load the catalog shipped with the server.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Read and validate a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a catalog from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let catalog: Catalog = serde_json::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Check the structural rules the symbol index relies on.
    ///
    /// Names must be non-empty and free of `.` so that a qualified label
    /// `module.member` always has exactly one separator. Module names must be
    /// unique and must not collide with a global function.
    pub fn validate(&self) -> std::result::Result<(), InvalidCatalog> {
        for (index, function) in self.globals.iter().enumerate() {
            check_function_name(function, "globals", index)?;
        }
        let globals: HashSet<&str> = self.globals.iter().map(|f| f.name.as_str()).collect();

        let mut seen = HashSet::new();
        for (index, module) in self.modules.iter().enumerate() {
            if module.name.is_empty() {
                return Err(InvalidCatalog::EmptyModuleName { index });
            }
            if module.name.contains('.') {
                return Err(InvalidCatalog::DottedName {
                    name: module.name.clone(),
                });
            }
            if !seen.insert(module.name.as_str()) {
                return Err(InvalidCatalog::DuplicateModule {
                    name: module.name.clone(),
                });
            }
            if globals.contains(module.name.as_str()) {
                return Err(InvalidCatalog::ModuleShadowsGlobal {
                    name: module.name.clone(),
                });
            }
            for (index, function) in module.functions.iter().enumerate() {
                check_function_name(function, &module.name, index)?;
            }
        }
        Ok(())
    }
}

fn check_function_name(
    function: &Function,
    owner: &str,
    index: usize,
) -> std::result::Result<(), InvalidCatalog> {
    if function.name.is_empty() {
        return Err(InvalidCatalog::EmptyFunctionName {
            owner: owner.to_string(),
            index,
        });
    }
    if function.name.contains('.') {
        return Err(InvalidCatalog::DottedName {
            name: function.name.clone(),
        });
    }
    Ok(())
}
