use dashmap::DashMap;
use std::sync::Arc;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::assist::lifecycle::QueryController;
use crate::buffer::EditorBuffer;
use crate::config::CompletionConfig;

/// One editor instance: its buffer and the controller of its queries.
#[derive(Debug, Clone)]
pub struct Document {
    pub uri: Url,
    pub language_id: String,
    pub version: i32,
    pub buffer: Arc<EditorBuffer>,
    pub queries: Arc<QueryController>,
}

impl Document {
    pub fn new(
        uri: Url,
        language_id: String,
        version: i32,
        content: &str,
        config: &CompletionConfig,
    ) -> Self {
        Self {
            buffer: Arc::new(EditorBuffer::new(language_id.clone(), content)),
            queries: Arc::new(QueryController::new(config)),
            uri,
            language_id,
            version,
        }
    }

    /// Replaces the content and returns the character the user typed, when
    /// the change looks like a single keystroke.
    pub fn apply_full_change(&mut self, version: i32, new_content: &str) -> Option<char> {
        self.version = version;
        let old = self.buffer.text();
        self.buffer.set_text(new_content);
        typed_char(&old, new_content)
    }
}

/// The character inserted between `old` and `new`. An inserted newline may
/// be followed by auto-indentation.
fn typed_char(old: &str, new: &str) -> Option<char> {
    if new.len() <= old.len() {
        return None;
    }
    let mut prefix = old
        .bytes()
        .zip(new.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    while !old.is_char_boundary(prefix) {
        prefix -= 1;
    }
    let suffix = old[prefix..]
        .bytes()
        .rev()
        .zip(new[prefix..].bytes().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let inserted = new.get(prefix..new.len() - suffix)?;
    let mut chars = inserted.chars();
    let first = chars.next()?;
    let rest_is_indent = if first == '\n' {
        chars.all(|c| c == ' ' || c == '\t')
    } else {
        chars.next().is_none()
    };
    rest_is_indent.then_some(first)
}

#[derive(Debug)]
pub struct DocumentStore {
    docs: DashMap<Url, Document>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    pub fn open(&self, doc: Document) {
        self.docs.insert(doc.uri.clone(), doc);
    }

    /// Full-sync update. Returns the typed character, if any.
    pub fn update(&self, uri: &Url, version: i32, content: &str) -> Option<char> {
        let mut doc = self.docs.get_mut(uri)?;
        let typed = doc.apply_full_change(version, content);
        debug!(uri = %uri, version, ?typed, "document updated");
        typed
    }

    /// Forgets the document; its pending queries are cancelled.
    pub fn close(&self, uri: &Url) {
        if let Some((_, doc)) = self.docs.remove(uri) {
            doc.queries.cancel_all();
        }
    }

    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.docs.get(uri).map(|d| d.clone())
    }

    pub fn for_each(&self, mut f: impl FnMut(&Document)) {
        for doc in self.docs.iter() {
            f(doc.value());
        }
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
