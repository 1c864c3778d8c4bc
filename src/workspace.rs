use crate::config::CompletionConfig;
use document::DocumentStore;

pub mod document;

/// Open editors of one client session.
pub struct Workspace {
    pub documents: DocumentStore,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            documents: DocumentStore::new(),
        }
    }

    /// Pushes new settings to the query controller of every open editor.
    pub fn apply_config(&self, config: &CompletionConfig) {
        self.documents.for_each(|doc| doc.queries.set_config(config));
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
