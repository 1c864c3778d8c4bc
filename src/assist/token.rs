use serde::Serialize;
use tracing::trace;

use super::error::{Result, check_offset};
use crate::language::{Language, LexToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    StringLiteral,
    TextBlock,
    CharLiteral,
    NumericLiteral,
    LineComment,
    BlockComment,
    DocComment,
    Identifier,
    Keyword,
    Operator,
    Whitespace,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            Self::LineComment | Self::BlockComment | Self::DocComment
        )
    }

    pub fn is_string(self) -> bool {
        matches!(self, Self::StringLiteral | Self::TextBlock)
    }
}

/// The token at the caret, with the verdict on whether completion may run there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub len: usize,
    pub is_code_context: bool,
}

/// Classifies the token at `offset` in `source`, using the front end's
/// token sequence.
///
/// `fallback_is_code` is used only when the source yields no tokens at all,
/// i.e. the buffer is empty; callers pass the document's own association.
pub fn classify(
    language: &dyn Language,
    source: &str,
    offset: usize,
    allow_in_string_literals: bool,
    fallback_is_code: bool,
) -> Result<Token> {
    check_offset(source, offset)?;
    let tokens = language.tokenize(source);
    Ok(classify_tokens(
        source,
        &tokens,
        offset,
        allow_in_string_literals,
        fallback_is_code,
    ))
}

fn classify_tokens(
    source: &str,
    tokens: &[LexToken],
    offset: usize,
    allow_in_string_literals: bool,
    fallback_is_code: bool,
) -> Token {
    let Some(lex) = token_at(tokens, offset) else {
        trace!(offset, fallback_is_code, "no tokens; using document association");
        return Token {
            kind: TokenKind::Whitespace,
            offset,
            len: 0,
            is_code_context: fallback_is_code,
        };
    };

    let is_code_context = if lex.start == offset {
        true
    } else {
        match lex.kind {
            TokenKind::NumericLiteral => source[lex.start..].starts_with('.'),
            TokenKind::CharLiteral => false,
            k if k.is_comment() => false,
            k if k.is_string() => allow_in_string_literals,
            _ => true,
        }
    };

    trace!(offset, kind = ?lex.kind, start = lex.start, is_code_context, "classified");
    Token {
        kind: lex.kind,
        offset: lex.start,
        len: lex.end - lex.start,
        is_code_context,
    }
}

/// Token containing `offset`; at the very end of the input, the last token.
fn token_at(tokens: &[LexToken], offset: usize) -> Option<&LexToken> {
    let idx = tokens.partition_point(|t| t.end <= offset);
    tokens.get(idx).or_else(|| tokens.last())
}
