//! Reconciles a backend fragment with the text already on the caret line.
//!
//! The backend generated its fragment against a placeholder-injected copy of
//! the buffer and does not know how much of it the user has typed already.
//! Alignment picks the span to replace so nothing gets typed twice, and falls
//! back to a plain insertion at the caret when no rule is confident.

use tracing::trace;

use super::candidate::{CandidateSnippet, InsertionPlan, Suggestion};
use super::context::SyntaxContext;
use super::token::{Token, TokenKind};
use crate::language::java::lexer::is_ident_part;

/// Which alignment rule fixed the backward span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// The first word before the caret matches the fragment's first word.
    FirstWord,
    /// The fragment continues the identifier the caret is in.
    MidWord,
    /// The fragment starts with the whole line.
    WholeLine,
    /// The fragment starts with everything typed before the caret.
    BeforeCaret,
    /// Both the line and the fragment are annotations.
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    rule: Option<Rule>,
}

/// Computes the insertion plan for one candidate.
///
/// `line` is the full caret line without its terminator and
/// `line_before_caret` its prefix up to `caret`.
pub fn align(
    candidate: &CandidateSnippet,
    line: &str,
    line_before_caret: &str,
    token: &Token,
    ctx: SyntaxContext,
    caret: usize,
) -> InsertionPlan {
    let line_start = caret.saturating_sub(line_before_caret.len());
    let in_string = token.kind == TokenKind::StringLiteral && ctx == SyntaxContext::StringLiteral;

    // inside a string literal the fragment is the literal's content only
    let before = if in_string {
        let from = token.offset.saturating_sub(line_start);
        let inner = line_before_caret.get(from..).unwrap_or(line_before_caret);
        inner.strip_prefix('"').unwrap_or(inner)
    } else {
        line_before_caret
    };

    let mut span = backward_span(&candidate.text, line, before, line_start, caret, in_string);

    let mid_word = span.rule == Some(Rule::MidWord);
    if !in_string && !mid_word && span.start != caret && span.end == caret {
        span.end += trailing_len(&candidate.text, line, caret - line_start);
    }

    let len = span.end - span.start;
    trace!(caret, start = span.start, len, rule = ?span.rule, "aligned candidate");
    InsertionPlan {
        replace_start: span.start,
        replace_len: (len > 0).then_some(len),
        insert_text: candidate.text.clone(),
        imports: candidate.imports.clone(),
    }
}

fn backward_span(
    snippet: &str,
    line: &str,
    before: &str,
    line_start: usize,
    caret: usize,
    in_string: bool,
) -> Span {
    let snippet_no_ws = strip_ws(snippet);
    let before_trimmed = before.trim_start();
    let before_start = caret - before_trimmed.len();

    let line_indent = line.len() - line.trim_start().len();
    let line_first = (line_start + line_indent).min(caret);
    let line_last = (line_start + line.trim_end().len()).max(caret);

    let line_word = first_word(before, true);
    let dangling = last_word(before);
    let line_no_ws = strip_ws(line);
    let before_no_ws = strip_ws(before_trimmed);

    let mut span = if !line_word.is_empty()
        && line_word.eq_ignore_ascii_case(first_word(snippet, false))
    {
        Span {
            start: before_start,
            end: caret,
            rule: Some(Rule::FirstWord),
        }
    } else if !dangling.is_empty() && snippet_no_ws.starts_with(dangling) {
        Span {
            start: caret - dangling.len(),
            end: caret,
            rule: Some(Rule::MidWord),
        }
    } else if !in_string && !line_no_ws.is_empty() && snippet_no_ws.starts_with(&line_no_ws) {
        Span {
            start: line_first,
            end: line_last,
            rule: Some(Rule::WholeLine),
        }
    } else if !before_no_ws.is_empty() && snippet_no_ws.starts_with(&before_no_ws) {
        Span {
            start: before_start,
            end: caret,
            rule: Some(Rule::BeforeCaret),
        }
    } else {
        Span {
            start: caret,
            end: caret,
            rule: None,
        }
    };

    if !in_string
        && line.trim_start().starts_with('@')
        && snippet.trim_start().starts_with('@')
    {
        span = Span {
            start: span.start.min(line_first),
            end: span.end.max(line_last),
            rule: Some(Rule::Annotation),
        };
    }
    span
}

/// Length of the text after the caret that the fragment supersedes, such as
/// an auto-closed `)` or a stray `;`. Zero when the fragment does not
/// reproduce that text somewhere.
fn trailing_len(snippet: &str, line: &str, caret_col: usize) -> usize {
    let tail = line.get(caret_col..).unwrap_or("").trim_end();
    let tail_no_ws = strip_ws(tail);
    if tail_no_ws.is_empty() || !strip_ws(snippet).contains(&tail_no_ws) {
        return 0;
    }
    tail.len()
}

/// Plan for a name-only strategy: the dangling identifier before the caret
/// is replaced by `name`. Names never carry imports.
pub fn align_identifier(name: &str, line_before_caret: &str, caret: usize) -> InsertionPlan {
    let dangling = last_word(line_before_caret).len();
    InsertionPlan {
        replace_start: caret - dangling,
        replace_len: (dangling > 0).then_some(dangling),
        insert_text: name.to_string(),
        imports: Vec::new(),
    }
}

/// Marks a suggestion live unless its span collides with an earlier live one.
pub fn partition_live(suggestions: &mut [Suggestion]) {
    let mut live: Vec<InsertionPlan> = Vec::new();
    for s in suggestions.iter_mut() {
        s.live = !live.iter().any(|p| p.overlaps(&s.plan));
        if s.live {
            live.push(s.plan.clone());
        }
    }
}

fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// First segment of `s` split on runs of non-alphanumeric characters. The
/// line flavour also keeps `.` and `<` inside a word.
fn first_word(s: &str, line_flavour: bool) -> &str {
    let s = s.trim();
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || (line_flavour && (c == '.' || c == '<'))))
        .unwrap_or(s.len());
    &s[..end]
}

/// Identifier characters immediately before the end of `s`.
fn last_word(s: &str) -> &str {
    let start = s
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_part(c))
        .last()
        .map_or(s.len(), |(i, _)| i);
    &s[start..]
}
