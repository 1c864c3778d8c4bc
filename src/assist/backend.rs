use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::candidate::CandidateSnippet;
use super::context::SyntaxContext;
use super::strategy::Strategy;

pub mod command;

/// Everything a backend gets to see for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendRequest {
    pub strategy: Strategy,
    pub placeholder: &'static str,
    pub context: SyntaxContext,
    pub parent: Option<SyntaxContext>,
    /// Text of the construct around the caret, possibly cut short.
    pub focus: String,
    pub line_before_caret: String,
    /// The buffer with the strategy's placeholder spliced in at the caret.
    pub source: String,
}

/// Generation backend, one request per strategy.
///
/// Every method defaults to "no suggestions" so adapters only implement
/// what they support.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn suggest_next_line_code(&self, _req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        Ok(Vec::new())
    }

    async fn suggest_annotations(&self, _req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        Ok(Vec::new())
    }

    async fn suggest_variable_names(&self, _req: &BackendRequest) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn suggest_method_names(&self, _req: &BackendRequest) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn suggest_method_invocations(
        &self,
        _req: &BackendRequest,
    ) -> Result<Vec<CandidateSnippet>> {
        Ok(Vec::new())
    }

    async fn suggest_string_literals(&self, _req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        Ok(Vec::new())
    }

    async fn suggest_if_conditions(&self, _req: &BackendRequest) -> Result<Vec<CandidateSnippet>> {
        Ok(Vec::new())
    }
}

/// Used when no backend is configured.
#[derive(Debug, Default)]
pub struct NoopBackend;

#[async_trait]
impl CompletionBackend for NoopBackend {}

/// Sends `req` to the method matching its strategy. A failing backend yields
/// no candidates.
pub async fn request(backend: &dyn CompletionBackend, req: &BackendRequest) -> Vec<CandidateSnippet> {
    let result = match req.strategy {
        Strategy::NextLineCode { .. } => backend.suggest_next_line_code(req).await,
        Strategy::Annotation => backend.suggest_annotations(req).await,
        Strategy::VariableNames => backend.suggest_variable_names(req).await.map(names_to_snippets),
        Strategy::MethodNames => backend.suggest_method_names(req).await.map(names_to_snippets),
        Strategy::MethodInvocation => backend.suggest_method_invocations(req).await,
        Strategy::StringLiteral => backend.suggest_string_literals(req).await,
        Strategy::IfCondition => backend.suggest_if_conditions(req).await,
    };
    match result {
        Ok(candidates) => {
            debug!(strategy = req.strategy.name(), count = candidates.len(), "backend responded");
            candidates
        }
        Err(e) => {
            warn!(strategy = req.strategy.name(), error = %e, "backend request failed");
            Vec::new()
        }
    }
}

fn names_to_snippets(names: Vec<String>) -> Vec<CandidateSnippet> {
    let mut out: Vec<CandidateSnippet> = Vec::new();
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !out.iter().any(|c| c.text == name) {
            out.push(CandidateSnippet::new(name, ""));
        }
    }
    out
}

/// Parses a backend's free-text reply into candidates.
///
/// Accepts a JSON array (of strings, or of objects with `snippet`/`text`,
/// `description` and `imports`), an object wrapping such an array under
/// `candidates`/`suggestions`, or a single object. The JSON may be wrapped in
/// a markdown fence or prose. Anything unreadable yields no candidates.
pub fn parse_candidates(raw: &str) -> Vec<CandidateSnippet> {
    let Some(value) = extract_json(raw) else {
        debug!(len = raw.len(), "no json payload in backend reply");
        return Vec::new();
    };
    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("candidates").or_else(|| obj.get("suggestions")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => std::slice::from_ref(&value),
        },
        _ => return Vec::new(),
    };
    items.iter().filter_map(parse_candidate).collect()
}

fn parse_candidate(item: &Value) -> Option<CandidateSnippet> {
    let (text, description, imports): (&str, &str, Vec<&str>) = match item {
        Value::String(s) => (s.as_str(), "", Vec::new()),
        Value::Object(obj) => {
            let text = ["snippet", "text", "code"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_str))?;
            let description = obj.get("description").and_then(Value::as_str).unwrap_or("");
            let imports = obj
                .get("imports")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            (text, description, imports)
        }
        _ => return None,
    };
    if text.trim().is_empty() {
        return None;
    }
    Some(CandidateSnippet::new(text, description).with_imports(imports))
}

fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed)
        && looks_like_payload(&value)
    {
        return Some(value);
    }
    for (idx, _) in text.match_indices(['[', '{']).take(32) {
        let mut de = serde_json::Deserializer::from_str(&text[idx..]);
        let Ok(value) = Value::deserialize(&mut de) else {
            continue;
        };
        if looks_like_payload(&value) {
            return Some(value);
        }
    }
    None
}

fn looks_like_payload(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}
