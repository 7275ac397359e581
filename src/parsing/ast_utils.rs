//! AST Utilities (C1): pure functions over a tree-sitter syntax tree.
//!
//! No hidden state, no panics on missing optional structure — every
//! function returns `None` rather than throwing when a field or descendant
//! is absent (spec §4.1).

use tree_sitter::Node;

/// Byte-range slice of `source` covered by `node`.
pub fn text_of<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Typed-child lookup by tree-sitter field name.
pub fn child_by_field<'a>(node: Node<'a>, field_name: &str) -> Option<Node<'a>> {
    node.child_by_field_name(field_name)
}

/// Depth-first search for the first descendant (including `node` itself)
/// whose grammar kind matches `type_name`.
pub fn first_descendant_of_type<'a>(node: Node<'a>, type_name: &str) -> Option<Node<'a>> {
    if node.kind() == type_name {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_descendant_of_type(child, type_name) {
            return Some(found);
        }
    }
    None
}

/// 1-based `(startLine, startCol, endLine, endCol)`, per spec §4.1.
pub fn node_line_column(node: Node) -> (u32, u16, u32, u16) {
    let start = node.start_position();
    let end = node.end_position();
    (
        start.row as u32 + 1,
        start.column as u16,
        end.row as u32 + 1,
        end.column as u16,
    )
}

/// Collect every descendant (including `node`) whose kind matches
/// `type_name`, in document order. Used by handlers that need every match
/// rather than only the first (e.g. comma-separated base classes).
pub fn all_descendants_of_type<'a>(node: Node<'a>, type_name: &str, out: &mut Vec<Node<'a>>) {
    if node.kind() == type_name {
        out.push(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        all_descendants_of_type(child, type_name, out);
    }
}
