//! AST-hierarchy qualified-name derivation (spec §4.4: "must not derive
//! qualifiedName from the mutable scope stack, to avoid duplication when
//! handlers are revisited"). Always ascend from the node being named; its
//! own name is never part of the ascent.

use crate::parsing::ast_utils::{child_by_field, text_of};
use tree_sitter::Node;

fn enclosing_names(node: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        if matches!(
            n.kind(),
            "namespace_definition" | "class_specifier" | "struct_specifier"
        ) {
            if let Some(name_node) = child_by_field(n, "name") {
                names.push(text_of(name_node, source).to_string());
            }
        }
        current = n.parent();
    }
    names.reverse();
    names
}

/// `::`-joined qualified name for `simple_name` defined at `node`, prefixed
/// by every enclosing namespace/class/struct name.
pub fn qualified_name(node: Node, source: &str, simple_name: &str) -> String {
    let mut segments = enclosing_names(node, source);
    segments.push(simple_name.to_string());
    segments.join("::")
}

/// The qualified name of the innermost enclosing namespace/class/struct,
/// or `None` at file scope.
pub fn enclosing_qualified_name(node: Node, source: &str) -> Option<String> {
    let segments = enclosing_names(node, source);
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("::"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::ast_utils::first_descendant_of_type;
    use tree_sitter::Parser;

    fn parse(src: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .unwrap();
        parser.parse(src, None).unwrap()
    }

    #[test]
    fn nested_namespace_and_struct_prefix() {
        let src = "namespace A { namespace B { struct S { int x; }; } }";
        let tree = parse(src);
        let field_ident = first_descendant_of_type(tree.root_node(), "field_identifier").unwrap();
        assert_eq!(qualified_name(field_ident, src, "x"), "A::B::S::x");
    }

    #[test]
    fn file_scope_has_no_prefix() {
        let src = "int x;";
        let tree = parse(src);
        let ident = first_descendant_of_type(tree.root_node(), "identifier").unwrap();
        assert_eq!(qualified_name(ident, src, "x"), "x");
    }
}
