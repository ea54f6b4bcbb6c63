//! Lexical context at a cursor position.
//!
//! Works on raw text only: the current line, the text before the cursor and
//! the identifier touching the cursor. LSP positions count characters in
//! UTF-16 code units; they are converted to byte offsets within the line.

use std::ops::Range;

/// Text surrounding the cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexicalContext<'a> {
    pub line_text: &'a str,
    pub text_before_cursor: &'a str,
    /// Identifier at the cursor, including a `module.` qualifier if present.
    pub token: &'a str,
    pub qualifying_module: Option<&'a str>,
    /// Byte range of `token` within `line_text`.
    pub token_span: Range<usize>,
}

pub fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Split text into lines on `\n`, dropping a trailing `\r` from each line.
///
/// Always yields at least one line; a trailing newline yields a final empty line.
pub fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// Resolve the context at `(line, character)`.
///
/// Returns `None` when `line` is past the last line. A `character` past the
/// end of the line is clamped to the end of the line.
pub fn resolve(text: &str, line: u32, character: u32) -> Option<LexicalContext<'_>> {
    let line_text = lines(text).nth(line as usize)?;
    let cursor = byte_offset(line_text, character);
    let bytes = line_text.as_bytes();

    let mut start = cursor;
    while start > 0 && is_identifier_byte(bytes[start - 1]) {
        start -= 1;
    }
    let mut end = cursor;
    while end < bytes.len() && is_identifier_byte(bytes[end]) {
        end += 1;
    }

    let mut qualifying_module = None;
    if start > 0 && bytes[start - 1] == b'.' {
        let dot = start - 1;
        let mut module_start = dot;
        while module_start > 0 && is_identifier_byte(bytes[module_start - 1]) {
            module_start -= 1;
        }
        // Keep the dot even with no module before it: `(x).print` -> `.print`
        if module_start < dot {
            qualifying_module = Some(&line_text[module_start..dot]);
        }
        start = module_start;
    }

    Some(LexicalContext {
        line_text,
        text_before_cursor: &line_text[..cursor],
        token: &line_text[start..end],
        qualifying_module,
        token_span: start..end,
    })
}

/// Convert a UTF-16 column to a byte offset in `line`, clamped to its length.
fn byte_offset(line: &str, character: u32) -> usize {
    let mut utf16_offset = 0u32;
    for (byte_offset, c) in line.char_indices() {
        if utf16_offset >= character {
            return byte_offset;
        }
        utf16_offset += c.len_utf16() as u32;
    }
    line.len()
}

/// Convert a byte offset in `line` to a UTF-16 column.
pub fn utf16_column(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset.min(line.len())]
        .chars()
        .map(|c| c.len_utf16() as u32)
        .sum()
}
