//! In-memory store of open documents.
//!
//! Documents are synchronized in full: every change replaces the whole
//! buffer. Each operation is a single replace-by-key on a concurrent map, so
//! a reader always sees either the old or the new text of a document.

use std::sync::Arc;

use dashmap::DashMap;
use lsp_types::Uri;

#[derive(Default, Clone)]
pub struct DocumentStore {
    documents: Arc<DashMap<String, Arc<str>>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, uri: &Uri, text: impl Into<Arc<str>>) {
        let key = uri.as_str().to_owned();
        self.documents.insert(key, text.into());
    }

    /// Replace the full text of a document. An unknown uri is opened.
    pub fn replace(&self, uri: &Uri, text: impl Into<Arc<str>>) {
        self.open(uri, text);
    }

    /// Forget a document. Closing an unknown uri does nothing.
    pub fn close(&self, uri: &Uri) {
        self.documents.remove(uri.as_str());
    }

    pub fn get(&self, uri: &Uri) -> Option<Arc<str>> {
        self.documents
            .get(uri.as_str())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
