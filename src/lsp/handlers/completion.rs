use std::sync::Arc;
use tower_lsp::lsp_types::*;
use tracing::{debug, warn};

use super::super::converters::{lsp_pos_to_offset, suggestions_to_items};
use crate::assist::engine::AssistEngine;
use crate::assist::lifecycle::Trigger;
use crate::workspace::Workspace;

/// `Invoked` requests are explicit queries; trigger-character requests are
/// auto queries and go through the single-flight policy.
pub fn trigger_of(context: Option<&CompletionContext>) -> Trigger {
    match context {
        Some(ctx) if ctx.trigger_kind == CompletionTriggerKind::TRIGGER_CHARACTER => ctx
            .trigger_character
            .as_deref()
            .and_then(|s| s.chars().next())
            .map_or(Trigger::Explicit, Trigger::Auto),
        _ => Trigger::Explicit,
    }
}

pub async fn handle_completion(
    workspace: Arc<Workspace>,
    engine: Arc<AssistEngine>,
    params: CompletionParams,
) -> Option<CompletionResponse> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    let trigger = trigger_of(params.context.as_ref());

    let doc = workspace.documents.get(uri)?;
    let caret = lsp_pos_to_offset(&doc.buffer.read(), position)?;

    debug!(
        uri = %uri,
        line = position.line,
        character = position.character,
        ?trigger,
        "completion request"
    );

    let snapshot = match engine.prepare(&doc.buffer, caret) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, caret, "cannot prepare completion query");
            return None;
        }
    };

    let handle = doc.queries.begin(trigger)?;
    let suggestions = engine.complete(&doc.queries, &handle, &snapshot).await?;
    let items = suggestions_to_items(&doc.buffer, &suggestions);

    debug!(count = items.len(), "returning completions");
    Some(CompletionResponse::List(CompletionList {
        is_incomplete: false,
        items,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::backend::{BackendRequest, CompletionBackend};
    use crate::assist::candidate::CandidateSnippet;
    use crate::config::CompletionConfig;
    use crate::workspace::document::Document;
    use async_trait::async_trait;

    struct Fixed;

    #[async_trait]
    impl CompletionBackend for Fixed {
        async fn suggest_next_line_code(
            &self,
            _req: &BackendRequest,
        ) -> anyhow::Result<Vec<CandidateSnippet>> {
            Ok(vec![CandidateSnippet::new("return 42;", "answer")])
        }
    }

    fn params(uri: &Url, line: u32, character: u32, context: Option<CompletionContext>) -> CompletionParams {
        CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri: uri.clone() },
                position: Position { line, character },
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context,
        }
    }

    #[test]
    fn test_trigger_mapping() {
        let invoked = CompletionContext {
            trigger_kind: CompletionTriggerKind::INVOKED,
            trigger_character: None,
        };
        let dot = CompletionContext {
            trigger_kind: CompletionTriggerKind::TRIGGER_CHARACTER,
            trigger_character: Some(".".into()),
        };
        assert_eq!(trigger_of(None), Trigger::Explicit);
        assert_eq!(trigger_of(Some(&invoked)), Trigger::Explicit);
        assert_eq!(trigger_of(Some(&dot)), Trigger::Auto('.'));
    }

    #[tokio::test]
    async fn test_completion_end_to_end() {
        let config = CompletionConfig::default();
        let workspace = Arc::new(Workspace::new());
        let uri = Url::parse("file:///src/A.java").unwrap();
        let src = "class A {\n    int f() {\n        ret\n    }\n}\n";
        workspace
            .documents
            .open(Document::new(uri.clone(), "java".into(), 1, src, &config));
        let engine = Arc::new(AssistEngine::new(config, Arc::new(Fixed)));

        let response = handle_completion(workspace, engine, params(&uri, 2, 11, None)).await;
        let Some(CompletionResponse::List(list)) = response else {
            panic!("expected a completion list");
        };
        assert_eq!(list.items.len(), 1);
        let item = &list.items[0];
        assert_eq!(item.label, "return 42;");
        assert_eq!(item.detail.as_deref(), Some("answer"));
        let Some(CompletionTextEdit::Edit(edit)) = &item.text_edit else {
            panic!("expected a plain text edit");
        };
        assert_eq!(edit.range.start, Position { line: 2, character: 8 });
        assert_eq!(edit.range.end, Position { line: 2, character: 11 });
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let workspace = Arc::new(Workspace::new());
        let engine = Arc::new(AssistEngine::new(CompletionConfig::default(), Arc::new(Fixed)));
        let uri = Url::parse("file:///src/Missing.java").unwrap();
        assert!(handle_completion(workspace, engine, params(&uri, 0, 0, None)).await.is_none());
    }
}
