use crate::assist::context::NodeCategory;
use crate::assist::token::TokenKind;
use tracing::warn;
use tree_sitter::{Node, Parser, Tree};

pub(crate) mod rope_utils;
pub(crate) mod ts_utils;

pub mod java;
pub use java::JavaLanguage;

/// One token of the front end's token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexToken {
    pub kind: TokenKind,
    pub start: usize,
    /// exclusive
    pub end: usize,
}

/// Compiler front end for one source language.
///
/// `node_category` is the mapping table from the grammar's native node kinds
/// to the closed [`SyntaxContext`](crate::assist::context::SyntaxContext) set.
pub trait Language: Send + Sync + std::fmt::Debug {
    fn id(&self) -> &'static str;
    fn supports(&self, language_id: &str) -> bool;

    fn make_parser(&self) -> Option<Parser>;

    /// Best-effort parse. `None` only when the parser itself is unusable;
    /// malformed input still yields a tree containing `ERROR` nodes.
    fn parse(&self, source: &str) -> Option<Tree> {
        let mut parser = self.make_parser()?;
        let tree = parser.parse(source, None);
        if tree.is_none() {
            warn!(lang = self.id(), len = source.len(), "parser produced no tree");
        }
        tree
    }

    fn tokenize(&self, source: &str) -> Vec<LexToken>;

    fn node_category(&self, kind: &str) -> NodeCategory;

    /// Whether `node` is the name of the declaration that contains it. Such
    /// names belong to the declaration rather than forming a context of
    /// their own.
    fn is_declared_name(&self, _node: Node) -> bool {
        false
    }
}

pub struct LanguageRegistry {
    languages: Vec<Box<dyn Language>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            languages: vec![Box::new(JavaLanguage)],
        }
    }

    pub fn find(&self, language_id: &str) -> Option<&dyn Language> {
        self.languages
            .iter()
            .find(|l| l.supports(language_id))
            .map(|l| l.as_ref())
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
