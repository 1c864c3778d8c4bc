use super::{Language, LexToken};
use crate::assist::context::{NodeCategory, SyntaxContext};
use tracing::warn;
use tree_sitter::{Node, Parser};

pub mod lexer;

#[derive(Debug)]
pub struct JavaLanguage;

impl Language for JavaLanguage {
    fn id(&self) -> &'static str {
        "java"
    }

    fn supports(&self, language_id: &str) -> bool {
        language_id == "java"
    }

    fn make_parser(&self) -> Option<Parser> {
        let mut parser = Parser::new();
        match parser.set_language(&tree_sitter_java::LANGUAGE.into()) {
            Ok(()) => Some(parser),
            Err(e) => {
                warn!(error = %e, "failed to load java grammar");
                None
            }
        }
    }

    fn tokenize(&self, source: &str) -> Vec<LexToken> {
        lexer::tokenize(source)
    }

    fn node_category(&self, kind: &str) -> NodeCategory {
        java_node_category(kind)
    }

    fn is_declared_name(&self, node: Node) -> bool {
        node.parent()
            .and_then(|p| p.child_by_field_name("name"))
            .is_some_and(|name| name.id() == node.id())
    }
}

/// tree-sitter-java node kind -> context category.
///
/// Kinds that only group children (argument lists, bodies, declarators) are
/// transparent: the resolver climbs to their parent instead.
pub fn java_node_category(kind: &str) -> NodeCategory {
    use SyntaxContext::*;
    let ctx = match kind {
        "ERROR" => Erroneous,
        "program" => CompilationUnit,
        "marker_annotation" | "annotation" | "element_value_pair" => Annotation,
        "modifiers" => Modifiers,
        "identifier" | "type_identifier" => Identifier,
        "class_declaration"
        | "interface_declaration"
        | "enum_declaration"
        | "record_declaration"
        | "annotation_type_declaration" => Class,
        "block" | "constructor_body" => Block,
        "expression_statement" => ExpressionStatement,
        "local_variable_declaration" | "field_declaration" | "formal_parameter" => Variable,
        "method_declaration" | "constructor_declaration" => Method,
        "method_invocation" => MethodInvocation,
        "string_literal" => StringLiteral,
        "parenthesized_expression" => Parenthesized,
        "field_access" => MemberSelect,
        "if_statement" => If,
        "argument_list"
        | "annotation_argument_list"
        | "class_body"
        | "interface_body"
        | "enum_body"
        | "annotation_type_body"
        | "variable_declarator"
        | "formal_parameters"
        | "string_fragment"
        | "escape_sequence" => return NodeCategory::Transparent,
        _ => Other,
    };
    NodeCategory::Context(ctx)
}
