//! Symbol index for completion and hover.
//!
//! Flattens the API catalog into an ordered list of symbols with their
//! labels, insertion snippets and rendered documentation. The index is built
//! once at startup and never mutated afterwards.

use std::collections::HashSet;

use lsp_types::{CompletionItemKind, MarkupContent, MarkupKind};
use tweaked_catalog::{Catalog, Function, Module};

/// Language tag used for fenced code blocks in documentation.
pub const FENCE_LANGUAGE: &str = "lua";

/// Wrap `code` in a fenced code block.
pub fn fenced(code: &str) -> String {
    format!("```{FENCE_LANGUAGE}\n{code}\n```")
}

/// Kind of an indexed symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Module,
    Function,
}

impl From<SymbolKind> for CompletionItemKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Module => CompletionItemKind::MODULE,
            SymbolKind::Function => CompletionItemKind::FUNCTION,
        }
    }
}

/// Documentation attached to a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Documentation {
    PlainText(String),
    Formatted { kind: MarkupKind, value: String },
}

impl Documentation {
    fn markdown(value: String) -> Self {
        Documentation::Formatted {
            kind: MarkupKind::Markdown,
            value,
        }
    }

    /// Raw text of the documentation, regardless of its format.
    pub fn text(&self) -> &str {
        match self {
            Documentation::PlainText(text) => text,
            Documentation::Formatted { value, .. } => value,
        }
    }
}

impl From<Documentation> for lsp_types::Documentation {
    fn from(doc: Documentation) -> Self {
        match doc {
            Documentation::PlainText(text) => lsp_types::Documentation::String(text),
            Documentation::Formatted { kind, value } => {
                lsp_types::Documentation::MarkupContent(MarkupContent { kind, value })
            }
        }
    }
}

/// One completable and hoverable entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    /// Bare name for globals and modules, `module.member` for module functions.
    pub label: String,
    pub kind: SymbolKind,
    /// Owning module, `None` for globals and modules themselves.
    pub module: Option<String>,
    pub signature: String,
    pub documentation: Documentation,
    /// Snippet inserted when the completion is accepted.
    pub insert_template: String,
    pub sort_key: String,
}

impl Symbol {
    /// Label without the owning module prefix.
    pub fn member_name(&self) -> &str {
        match &self.module {
            Some(module) => self
                .label
                .strip_prefix(module.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(&self.label),
            None => &self.label,
        }
    }

    /// Short text shown next to the label in completion lists.
    pub fn detail(&self) -> &str {
        match self.kind {
            SymbolKind::Module => "module",
            SymbolKind::Function => &self.signature,
        }
    }

    fn function(function: &Function, module: Option<&str>) -> Self {
        let label = match module {
            Some(module) => format!("{module}.{}", function.name),
            None => function.name.clone(),
        };
        let sort_key = format!("!{label}");
        Symbol {
            label,
            kind: SymbolKind::Function,
            module: module.map(str::to_string),
            signature: function.signature.clone(),
            documentation: Documentation::markdown(function_documentation(function)),
            insert_template: insert_template(function),
            sort_key,
        }
    }

    fn module(module: &Module) -> Self {
        Symbol {
            label: module.name.clone(),
            kind: SymbolKind::Module,
            module: None,
            signature: module.name.clone(),
            documentation: Documentation::markdown(module_documentation(module)),
            insert_template: module.name.clone(),
            sort_key: format!("!{}", module.name),
        }
    }
}

/// Ordered, immutable collection of symbols.
#[derive(Clone, Debug, Default)]
pub struct SymbolIndex {
    symbols: Vec<Symbol>,
}

impl SymbolIndex {
    /// Build the index from a validated catalog.
    ///
    /// Globals come first, then each module followed by its functions, in
    /// catalog order. A label seen twice keeps its first occurrence.
    pub fn build(catalog: &Catalog) -> Self {
        let mut builder = IndexBuilder::default();

        for function in &catalog.globals {
            builder.push(Symbol::function(function, None));
        }
        for module in &catalog.modules {
            builder.push(Symbol::module(module));
            for function in &module.functions {
                builder.push(Symbol::function(function, Some(&module.name)));
            }
        }

        tracing::debug!(count = builder.symbols.len(), "Built symbol index");
        Self {
            symbols: builder.symbols,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Find the symbol whose label is exactly `label`.
    pub fn get(&self, label: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.label == label)
    }
}

#[derive(Default)]
struct IndexBuilder {
    symbols: Vec<Symbol>,
    labels: HashSet<String>,
}

impl IndexBuilder {
    fn push(&mut self, symbol: Symbol) {
        if !self.labels.insert(symbol.label.clone()) {
            tracing::warn!(label = %symbol.label, "Dropping duplicate catalog entry");
            return;
        }
        self.symbols.push(symbol);
    }
}

fn insert_template(function: &Function) -> String {
    let placeholders: Vec<String> = function
        .parameters
        .iter()
        .enumerate()
        .map(|(i, param)| format!("${{{}:{}}}", i + 1, param.name))
        .collect();
    format!("{}({})$0", function.name, placeholders.join(", "))
}

fn optional_marker(optional: bool) -> &'static str {
    if optional { " (optional)" } else { "" }
}

fn function_documentation(function: &Function) -> String {
    let mut doc = if function.signature.is_empty() {
        function.description.clone()
    } else {
        format!("{}\n\n{}", fenced(&function.signature), function.description)
    };

    if !function.parameters.is_empty() {
        doc.push_str("\n\n**Parameters:**");
        for param in &function.parameters {
            doc.push_str(&format!(
                "\n- `{}`: {}{}",
                param.name,
                param.description,
                optional_marker(param.optional)
            ));
        }
    }

    if !function.returns.is_empty() {
        doc.push_str("\n\n**Returns:**");
        for ret in &function.returns {
            doc.push_str(&format!(
                "\n- `{}` ({}): {}{}",
                ret.name,
                ret.ty,
                ret.description,
                optional_marker(ret.optional)
            ));
        }
    }

    if let Some(example) = function.example.as_deref().filter(|e| !e.is_empty()) {
        doc.push_str("\n\n**Example:**\n");
        doc.push_str(&fenced(example));
    }

    doc
}

fn module_documentation(module: &Module) -> String {
    let header = fenced(&module.name);
    [
        header.as_str(),
        module.description.as_str(),
        module.documentation.as_str(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("\n\n")
}
