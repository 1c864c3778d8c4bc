use std::sync::Arc;

use tracing::{debug, instrument};

use super::align::{align, align_identifier, partition_live};
use super::backend::{self, BackendRequest, CompletionBackend};
use super::candidate::{CandidateSnippet, Suggestion};
use super::context::{self, ResolvedContext};
use super::error::Result;
use super::lifecycle::{QueryController, QueryHandle};
use super::strategy::{self, ResponseShape, Strategy};
use super::token::{self, Token};
use crate::buffer::{CaretLine, EditorBuffer};
use crate::config::CompletionConfig;
use crate::language::{JavaLanguage, Language};

/// Everything computed synchronously for one query, before the backend call.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub caret: usize,
    pub line: CaretLine,
    pub token: Token,
    pub resolved: ResolvedContext,
    pub strategy: Strategy,
    pub request: BackendRequest,
}

pub struct AssistEngine {
    config: CompletionConfig,
    backend: Arc<dyn CompletionBackend>,
    language: JavaLanguage,
}

impl AssistEngine {
    pub fn new(config: CompletionConfig, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            config,
            backend,
            language: JavaLanguage,
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Classifies the caret, resolves its context and builds the backend
    /// request. `None` when completion does not apply at `caret`.
    ///
    /// Works on one snapshot of the buffer, taken under its read lock.
    #[instrument(skip(self, buffer), fields(lang = buffer.language_id()))]
    pub fn prepare(&self, buffer: &EditorBuffer, caret: usize) -> Result<Option<QuerySnapshot>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let source = buffer.text();
        let token = token::classify(
            &self.language,
            &source,
            caret,
            self.config.allow_in_string_literals,
            buffer.is_code_document(),
        )?;
        if !token.is_code_context {
            debug!(kind = ?token.kind, "caret outside code; no query");
            return Ok(None);
        }

        let line = CaretLine::at(&source, caret)?;
        let tree = self.language.parse(&source);
        let resolved = context::resolve(&self.language, tree.as_ref(), caret);
        let strategy = strategy::select(resolved.context, resolved.parent, line.leading_char());

        let focus = source.get(resolved.span.clone()).unwrap_or("");
        let request = BackendRequest {
            strategy,
            placeholder: strategy.placeholder(),
            context: resolved.context,
            parent: resolved.parent,
            focus: truncate_chars(focus, self.config.max_focus_chars).to_string(),
            line_before_caret: line.before_caret().to_string(),
            source: strategy::inject_placeholder(&source, caret, strategy)?,
        };
        debug!(context = ?resolved.context, parent = ?resolved.parent, ?strategy, "query prepared");

        Ok(Some(QuerySnapshot {
            caret,
            line,
            token,
            resolved,
            strategy,
            request,
        }))
    }

    /// Calls the backend under `handle` and aligns what comes back.
    ///
    /// `None` when the query was cancelled; a failing backend gives an empty
    /// list instead.
    pub async fn complete(
        &self,
        queries: &QueryController,
        handle: &QueryHandle,
        snapshot: &QuerySnapshot,
    ) -> Option<Vec<Suggestion>> {
        let candidates = queries
            .run(handle, backend::request(self.backend.as_ref(), &snapshot.request))
            .await?;
        Some(self.align_all(snapshot, candidates))
    }

    /// Aligns candidates in backend order. Later candidates whose span
    /// collides with an earlier one are kept as alternates.
    pub fn align_all(
        &self,
        snapshot: &QuerySnapshot,
        candidates: Vec<CandidateSnippet>,
    ) -> Vec<Suggestion> {
        let before = snapshot.line.before_caret();
        let mut suggestions: Vec<Suggestion> = candidates
            .into_iter()
            .filter(|c| !c.text.trim().is_empty())
            .take(self.config.max_suggestions)
            .map(|c| {
                let plan = match snapshot.strategy.response_shape() {
                    ResponseShape::Identifiers => align_identifier(c.text.trim(), before, snapshot.caret),
                    ResponseShape::CodeFragment => align(
                        &c,
                        &snapshot.line.text,
                        before,
                        &snapshot.token,
                        snapshot.resolved.context,
                        snapshot.caret,
                    ),
                };
                Suggestion {
                    label: strategy::display_label(snapshot.strategy, &c.text),
                    detail: c.description,
                    plan,
                    live: false,
                }
            })
            .collect();
        partition_live(&mut suggestions);
        suggestions
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(i, _)| &s[..i])
}
