use tree_sitter::Node;

/// Named node under the caret.
///
/// Prefers the node covering the byte just before `offset`, so a caret placed
/// right after an identifier resolves to that identifier rather than to
/// whatever follows it. Falls back to the node covering the byte after.
pub fn find_cursor_node<'tree>(root: Node<'tree>, offset: usize) -> Option<Node<'tree>> {
    if offset > 0
        && let Some(n) = root.named_descendant_for_byte_range(offset - 1, offset)
        && n.end_byte() >= offset
    {
        return Some(n);
    }
    if offset < root.end_byte()
        && let Some(n) = root.named_descendant_for_byte_range(offset, offset + 1)
    {
        return Some(n);
    }
    None
}

/// Walks from `node` to the root, `node` included.
pub fn ancestors(node: Node<'_>) -> impl Iterator<Item = Node<'_>> {
    std::iter::successors(Some(node), |n| n.parent())
}

pub fn is_error_node(node: Node) -> bool {
    node.is_error() || node.is_missing() || node.kind() == "ERROR"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse_java(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .unwrap();
        parser.parse(src, None).unwrap()
    }

    fn kind_at(src: &str, offset: usize) -> Option<String> {
        let tree = parse_java(src);
        find_cursor_node(tree.root_node(), offset).map(|n| n.kind().to_string())
    }

    #[test]
    fn test_caret_after_identifier_finds_identifier() {
        let src = "class A { void f() { foo(); } }";
        let offset = src.find("foo").unwrap() + 3;
        assert_eq!(kind_at(src, offset).as_deref(), Some("identifier"));
    }

    #[test]
    fn test_caret_on_blank_line_in_method_finds_block() {
        let src = "class A {\n    void foo() {\n        \n    }\n}\n";
        let offset = src.find("        \n").unwrap() + 8;
        assert_eq!(kind_at(src, offset).as_deref(), Some("block"));
    }

    #[test]
    fn test_caret_at_start_uses_following_node() {
        let src = "class A {}";
        assert!(kind_at(src, 0).is_some());
    }

    #[test]
    fn test_ancestors_end_at_program() {
        let src = "class A { int x; }";
        let tree = parse_java(src);
        let offset = src.find('x').unwrap() + 1;
        let node = find_cursor_node(tree.root_node(), offset).unwrap();
        let last = ancestors(node).last().unwrap();
        assert_eq!(last.kind(), "program");
    }

    #[test]
    fn test_error_node_detected() {
        let src = "}}}";
        let tree = parse_java(src);
        assert!(tree.root_node().has_error());
        let node = find_cursor_node(tree.root_node(), 1).unwrap();
        assert!(is_error_node(node), "got {}", node.kind());
    }
}
