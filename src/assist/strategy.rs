use serde::Serialize;

use super::context::SyntaxContext;
use super::error::{Result, check_offset};

/// What to ask the backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Continue with code. `fresh_line` is set when the caret line is blank.
    NextLineCode { fresh_line: bool },
    Annotation,
    VariableNames,
    MethodNames,
    MethodInvocation,
    StringLiteral,
    IfCondition,
}

/// Shape of the backend's reply for a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseShape {
    CodeFragment,
    Identifiers,
}

impl Strategy {
    /// Marker spliced into the buffer at the caret before it is sent out.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::NextLineCode { .. } => "${SUGGEST_CODE_LIST}",
            Self::Annotation => "${SUGGEST_ANNOTATION_LIST}",
            Self::VariableNames => "${SUGGEST_VAR_NAMES_LIST}",
            Self::MethodNames => "${SUGGEST_METHOD_NAMES_LIST}",
            Self::MethodInvocation => "${SUGGEST_METHOD_INVOCATION}",
            Self::StringLiteral => "${SUGGEST_STRING_LITERAL_LIST}",
            Self::IfCondition => "${SUGGEST_IF_CONDITIONS}",
        }
    }

    pub fn response_shape(self) -> ResponseShape {
        match self {
            Self::VariableNames | Self::MethodNames => ResponseShape::Identifiers,
            _ => ResponseShape::CodeFragment,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NextLineCode { .. } => "next_line_code",
            Self::Annotation => "annotation",
            Self::VariableNames => "variable_names",
            Self::MethodNames => "method_names",
            Self::MethodInvocation => "method_invocation",
            Self::StringLiteral => "string_literal",
            Self::IfCondition => "if_condition",
        }
    }
}

/// Picks the strategy for a resolved context. First matching row wins.
///
/// `leading_line_char` is the first non-whitespace character of the caret
/// line, `None` when the line is blank.
pub fn select(
    ctx: SyntaxContext,
    parent: Option<SyntaxContext>,
    leading_line_char: Option<char>,
) -> Strategy {
    use SyntaxContext::*;

    let next_line = Strategy::NextLineCode {
        fresh_line: leading_line_char.is_none(),
    };
    match ctx {
        Erroneous | CompilationUnit => next_line,
        _ if leading_line_char == Some('@') || ctx == Annotation => Strategy::Annotation,
        Modifiers | Identifier | Class | Block | ExpressionStatement => next_line,
        MemberSelect if parent == Some(MethodInvocation) => next_line,
        Variable => Strategy::VariableNames,
        Method => Strategy::MethodNames,
        MethodInvocation => Strategy::MethodInvocation,
        StringLiteral => Strategy::StringLiteral,
        Parenthesized if parent == Some(If) => Strategy::IfCondition,
        _ => next_line,
    }
}

/// Splices the strategy's marker into `source` at `caret`.
pub fn inject_placeholder(source: &str, caret: usize, strategy: Strategy) -> Result<String> {
    check_offset(source, caret)?;
    let marker = strategy.placeholder();
    let mut out = String::with_capacity(source.len() + marker.len());
    out.push_str(&source[..caret]);
    out.push_str(marker);
    out.push_str(&source[caret..]);
    Ok(out)
}

/// Menu text for a candidate: its first non-blank line, escaped where the
/// host renders generic types as markup.
pub fn display_label(strategy: Strategy, text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    match strategy {
        Strategy::MethodInvocation => escape_html(line),
        _ => line.to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use SyntaxContext::*;

    #[test]
    fn test_select_is_total() {
        let parents = std::iter::once(None).chain(SyntaxContext::ALL.map(Some));
        for parent in parents {
            for ctx in SyntaxContext::ALL {
                for lead in [None, Some('@'), Some('x')] {
                    let strategy = select(ctx, parent, lead);
                    assert!(!strategy.placeholder().is_empty());
                }
            }
        }
    }

    #[test]
    fn test_erroneous_beats_annotation_marker() {
        assert_eq!(
            select(Erroneous, None, Some('@')),
            Strategy::NextLineCode { fresh_line: false }
        );
        assert_eq!(
            select(CompilationUnit, None, None),
            Strategy::NextLineCode { fresh_line: true }
        );
    }

    #[test]
    fn test_annotation_marker_beats_context() {
        assert_eq!(select(Variable, None, Some('@')), Strategy::Annotation);
        assert_eq!(select(Annotation, Some(Modifiers), Some('p')), Strategy::Annotation);
    }

    #[test]
    fn test_table_rows() {
        let code = Strategy::NextLineCode { fresh_line: false };
        assert_eq!(select(Block, Some(Method), Some('i')), code);
        assert_eq!(select(MemberSelect, Some(MethodInvocation), Some('f')), code);
        assert_eq!(select(Variable, Some(Block), Some('i')), Strategy::VariableNames);
        assert_eq!(select(Method, Some(Class), Some('v')), Strategy::MethodNames);
        assert_eq!(
            select(MethodInvocation, Some(Block), Some('f')),
            Strategy::MethodInvocation
        );
        assert_eq!(select(StringLiteral, None, Some('S')), Strategy::StringLiteral);
        assert_eq!(select(Parenthesized, Some(If), Some('i')), Strategy::IfCondition);
        assert_eq!(select(Parenthesized, Some(Block), Some('i')), code);
        assert_eq!(select(Other, None, Some('x')), code);
        assert_eq!(select(If, Some(Block), Some('i')), code);
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(Strategy::VariableNames.response_shape(), ResponseShape::Identifiers);
        assert_eq!(Strategy::MethodNames.response_shape(), ResponseShape::Identifiers);
        assert_eq!(Strategy::IfCondition.response_shape(), ResponseShape::CodeFragment);
    }

    #[test]
    fn test_inject_placeholder() {
        let out = inject_placeholder("if () {}", 4, Strategy::IfCondition).unwrap();
        insta::assert_snapshot!(out, @"if (${SUGGEST_IF_CONDITIONS}) {}");
        assert!(inject_placeholder("ab", 5, Strategy::Annotation).is_err());
    }

    #[test]
    fn test_display_label_escapes_invocations() {
        assert_eq!(
            display_label(Strategy::MethodInvocation, "new ArrayList<String>()"),
            "new ArrayList&lt;String&gt;()"
        );
        assert_eq!(
            display_label(Strategy::NextLineCode { fresh_line: true }, "\n  List<A> a;\nfoo();"),
            "List<A> a;"
        );
    }
}
