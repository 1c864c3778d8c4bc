use std::ops::Range;

use serde::Serialize;
use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::language::Language;
use crate::language::ts_utils::{ancestors, find_cursor_node, is_error_node};

/// Category of the narrowest construct around the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyntaxContext {
    Erroneous,
    CompilationUnit,
    Annotation,
    Modifiers,
    Identifier,
    Class,
    Block,
    ExpressionStatement,
    Variable,
    Method,
    MethodInvocation,
    StringLiteral,
    Parenthesized,
    MemberSelect,
    If,
    Other,
}

impl SyntaxContext {
    pub const ALL: [SyntaxContext; 16] = [
        Self::Erroneous,
        Self::CompilationUnit,
        Self::Annotation,
        Self::Modifiers,
        Self::Identifier,
        Self::Class,
        Self::Block,
        Self::ExpressionStatement,
        Self::Variable,
        Self::Method,
        Self::MethodInvocation,
        Self::StringLiteral,
        Self::Parenthesized,
        Self::MemberSelect,
        Self::If,
        Self::Other,
    ];
}

/// What a grammar node kind maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeCategory {
    Context(SyntaxContext),
    /// Pure grouping node; the resolver looks at its parent instead.
    Transparent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub context: SyntaxContext,
    pub parent: Option<SyntaxContext>,
    /// Source span of the located construct.
    pub span: Range<usize>,
}

impl ResolvedContext {
    fn erroneous(span: Range<usize>) -> Self {
        Self {
            context: SyntaxContext::Erroneous,
            parent: None,
            span,
        }
    }
}

/// Resolves the construct enclosing `offset`.
///
/// Never fails: a missing tree or an error node under the caret both resolve
/// to [`SyntaxContext::Erroneous`] so completion keeps working mid-edit.
pub fn resolve(language: &dyn Language, tree: Option<&Tree>, offset: usize) -> ResolvedContext {
    let Some(tree) = tree else {
        debug!(offset, "no syntax tree; resolving as erroneous");
        return ResolvedContext::erroneous(offset..offset);
    };
    let root = tree.root_node();
    let node = find_cursor_node(root, offset).unwrap_or(root);

    // climb past grouping nodes; an error anywhere on the way wins
    let mut located = None;
    for n in ancestors(node) {
        if is_error_node(n) {
            debug!(offset, kind = n.kind(), "caret inside error node");
            return ResolvedContext::erroneous(n.byte_range());
        }
        if language.is_declared_name(n) {
            continue;
        }
        if let NodeCategory::Context(ctx) = language.node_category(n.kind()) {
            located = Some((n, ctx));
            break;
        }
    }
    let Some((node, context)) = located else {
        return ResolvedContext::erroneous(root.byte_range());
    };

    let parent = parent_context(language, node);
    debug!(offset, ?context, ?parent, kind = node.kind(), "resolved context");
    ResolvedContext {
        context,
        parent,
        span: node.byte_range(),
    }
}

fn parent_context(language: &dyn Language, node: Node) -> Option<SyntaxContext> {
    ancestors(node).skip(1).find_map(|n| {
        if is_error_node(n) {
            return Some(SyntaxContext::Erroneous);
        }
        match language.node_category(n.kind()) {
            NodeCategory::Context(ctx) => Some(ctx),
            NodeCategory::Transparent => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::JavaLanguage;
    use indoc::indoc;

    /// `|` marks the caret.
    fn resolve_at(src: &str) -> ResolvedContext {
        let offset = src.find('|').unwrap();
        let src = src.replacen('|', "", 1);
        let tree = JavaLanguage.parse(&src);
        resolve(&JavaLanguage, tree.as_ref(), offset)
    }

    #[test]
    fn test_if_condition() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                void f(int a, int b) {
                    if (|a == b) {}
                }
            }
        "#});
        // caret before `a`: the byte before it is `(`
        assert_eq!(ctx.context, SyntaxContext::Parenthesized);
        assert_eq!(ctx.parent, Some(SyntaxContext::If));
    }

    #[test]
    fn test_field_name() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                int count|;
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::Variable);
        assert_eq!(ctx.parent, Some(SyntaxContext::Class));
    }

    #[test]
    fn test_method_name() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                void run|() {}
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::Method);
        assert_eq!(ctx.parent, Some(SyntaxContext::Class));
    }

    #[test]
    fn test_local_variable_name() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                void f() {
                    int tot| = 0;
                }
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::Variable);
        assert_eq!(ctx.parent, Some(SyntaxContext::Block));
    }

    #[test]
    fn test_reference_stays_identifier() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                void f() {
                    int x = tot|;
                }
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::Identifier);
        assert_eq!(ctx.parent, Some(SyntaxContext::Variable));
    }

    #[test]
    fn test_inside_string_literal() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                String s = "hel|lo";
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::StringLiteral);
        assert_eq!(ctx.parent, Some(SyntaxContext::Variable));
    }

    #[test]
    fn test_argument_list_resolves_to_invocation() {
        let ctx = resolve_at(indoc! {r#"
            class A {
                void f() {
                    foo(a, |b);
                }
            }
        "#});
        assert_eq!(ctx.context, SyntaxContext::MethodInvocation);
        assert_eq!(ctx.parent, Some(SyntaxContext::ExpressionStatement));
    }

    #[test]
    fn test_blank_line_in_method_body() {
        let ctx = resolve_at("class A {\n    void f() {\n        |\n    }\n}\n");
        assert_eq!(ctx.context, SyntaxContext::Block);
        assert_eq!(ctx.parent, Some(SyntaxContext::Method));
    }

    #[test]
    fn test_between_top_level_declarations() {
        let ctx = resolve_at("class A {}\n|\nclass B {}\n");
        assert_eq!(ctx.context, SyntaxContext::CompilationUnit);
        assert_eq!(ctx.parent, None);
    }

    #[test]
    fn test_garbage_is_erroneous() {
        let ctx = resolve_at("}|}}");
        assert_eq!(ctx.context, SyntaxContext::Erroneous);
    }

    #[test]
    fn test_missing_tree_is_erroneous() {
        let ctx = resolve(&JavaLanguage, None, 3);
        assert_eq!(ctx.context, SyntaxContext::Erroneous);
        assert_eq!(ctx.span, 3..3);
    }
}
