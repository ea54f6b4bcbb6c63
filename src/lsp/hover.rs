//! Hover documentation lookup.

use super::symbol_index::{Documentation, FENCE_LANGUAGE, Symbol, SymbolIndex, fenced};

pub struct HoverEngine<'idx> {
    index: &'idx SymbolIndex,
}

impl<'idx> HoverEngine<'idx> {
    pub fn new(index: &'idx SymbolIndex) -> Self {
        Self { index }
    }

    /// Find the symbol a token refers to.
    ///
    /// An exact label match wins. A bare identifier otherwise resolves to the
    /// module member of that name, but only when a single module defines it.
    pub fn resolve(&self, token: &str) -> Option<&'idx Symbol> {
        if token.is_empty() {
            return None;
        }
        if let Some(symbol) = self.index.get(token) {
            return Some(symbol);
        }
        if token.contains('.') {
            return None;
        }

        let mut members = self
            .index
            .symbols()
            .iter()
            .filter(|symbol| symbol.module.is_some() && symbol.member_name() == token);
        let symbol = members.next()?;
        if members.next().is_some() {
            tracing::debug!(token, "Ambiguous member name, no hover");
            return None;
        }
        Some(symbol)
    }

    /// Rendered markdown for the symbol a token refers to.
    pub fn hover(&self, token: &str) -> Option<String> {
        self.resolve(token).and_then(render)
    }
}

/// Render a symbol as markdown: its signature block followed by its documentation.
///
/// A formatted documentation that already starts with a signature block has
/// that block removed so the signature appears once.
pub fn render(symbol: &Symbol) -> Option<String> {
    let mut content = String::new();
    let has_signature = !symbol.signature.is_empty();

    if has_signature {
        content.push_str(&fenced(&symbol.signature));
        content.push_str("\n\n");
    }

    match &symbol.documentation {
        Documentation::Formatted { value, .. } if has_signature => {
            content.push_str(strip_signature_block(value));
        }
        Documentation::Formatted { value, .. } => content.push_str(value),
        Documentation::PlainText(text) => content.push_str(text),
    }

    let content = content.trim_end();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

fn strip_signature_block(doc: &str) -> &str {
    let open = format!("```{FENCE_LANGUAGE}\n");
    let Some(rest) = doc.strip_prefix(open.as_str()) else {
        return doc;
    };
    match rest.find("```") {
        Some(close) => rest[close + 3..].trim_start_matches('\n'),
        None => doc,
    }
}
