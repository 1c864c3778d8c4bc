use tower_lsp::lsp_types::*;

use crate::config::CompletionConfig;

pub fn server_capabilities(config: &CompletionConfig) -> ServerCapabilities {
    let trigger_characters = config
        .auto_trigger_chars
        .iter()
        .map(|c| c.to_string())
        .collect();
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
        completion_provider: Some(CompletionOptions {
            resolve_provider: Some(false),
            trigger_characters: Some(trigger_characters),
            all_commit_characters: None,
            completion_item: Some(CompletionOptionsCompletionItem {
                label_details_support: Some(false),
            }),
            work_done_progress_options: WorkDoneProgressOptions {
                work_done_progress: None,
            },
        }),
        ..Default::default()
    }
}
