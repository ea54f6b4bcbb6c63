//! Completion filtering over the symbol index.

use super::lexical::is_identifier_byte;
use super::symbol_index::{Symbol, SymbolIndex};

pub struct CompletionEngine<'idx> {
    index: &'idx SymbolIndex,
}

impl<'idx> CompletionEngine<'idx> {
    pub fn new(index: &'idx SymbolIndex) -> Self {
        Self { index }
    }

    /// Candidates for the text before the cursor, in index order.
    ///
    /// - `module.partial`: members of `module` starting with `partial`,
    ///   relabelled with their bare member name.
    /// - empty text: the whole index.
    /// - anything else: globals and modules whose label starts with the text.
    pub fn complete(&self, text_before_cursor: &str) -> Vec<Symbol> {
        let text = text_before_cursor.trim();

        if let Some((head, partial)) = text.rsplit_once('.') {
            let segment = head.rsplit_once('.').map_or(head, |(_, segment)| segment);
            return self.complete_member(trailing_identifier(segment), partial);
        }

        if text.is_empty() {
            return self.index.symbols().to_vec();
        }

        self.index
            .symbols()
            .iter()
            .filter(|symbol| !symbol.label.contains('.') && symbol.label.starts_with(text))
            .cloned()
            .collect()
    }

    fn complete_member(&self, module: &str, partial: &str) -> Vec<Symbol> {
        if module.is_empty() {
            return Vec::new();
        }
        let prefix = format!("{module}.");

        self.index
            .symbols()
            .iter()
            .filter_map(|symbol| {
                let member = symbol.label.strip_prefix(prefix.as_str())?;
                if !member.starts_with(partial) {
                    return None;
                }
                let mut item = symbol.clone();
                item.sort_key = format!("!{member}");
                item.label = member.to_string();
                Some(item)
            })
            .collect()
    }
}

/// The identifier run at the end of `text`, e.g. `term` for `x = term`.
fn trailing_identifier(text: &str) -> &str {
    let start = text
        .bytes()
        .rposition(|b| !is_identifier_byte(b))
        .map_or(0, |i| i + 1);
    &text[start..]
}
