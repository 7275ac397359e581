//! Relationship Handlers (C5, spec §4.5).

use crate::parsing::ast_utils::{child_by_field, node_line_column, text_of};
use crate::parsing::cpp::context::ParseContext;
use crate::parsing::cpp::symbols::CONTROL_KEYWORDS;
use crate::relationship::{RelationKind, Relationship};
use crate::symbol::SymbolId;
use tree_sitter::Node;

fn line_col(node: Node) -> (u32, u16) {
    let (line, col, _, _) = node_line_column(node);
    (line, col)
}

/// `call_expression` (spec §4.5 "Call").
pub fn handle_call(node: Node, ctx: &mut ParseContext) {
    let Some(function_node) = child_by_field(node, "function") else {
        return;
    };
    let callee_name = match function_node.kind() {
        "identifier" => text_of(function_node, ctx.source).to_string(),
        "field_expression" => child_by_field(function_node, "field")
            .map(|f| text_of(f, ctx.source).to_string())
            .unwrap_or_default(),
        "qualified_identifier" => text_of(function_node, ctx.source).to_string(),
        _ => text_of(function_node, ctx.source).to_string(),
    };
    if callee_name.is_empty() || CONTROL_KEYWORDS.contains(&callee_name.as_str()) {
        return;
    }

    let Some(from_id) = ctx.enclosing_function_id() else {
        return;
    };
    let (line, col) = line_col(node);

    let resolved = ctx.cache.resolve_symbol(&callee_name, &ctx.resolution).or_else(|| {
        let scoped = ctx
            .enclosing_type_scope()
            .map(|s| format!("{}::{}", s.qualified_name, callee_name));
        scoped.and_then(|name| ctx.cache.resolve_symbol(&name, &ctx.resolution))
    });

    let relationship = Relationship::new(ctx.project_id, RelationKind::Calls)
        .from(from_id)
        .at(line, col);

    let relationship = match resolved {
        Some(target) => relationship.to(target.id).with_confidence(1.0),
        None => relationship.unresolved(callee_name).with_confidence(0.6),
    };
    ctx.record_relationship(relationship);
}

/// `base_class_clause` (spec §4.5 "Inheritance").
pub fn handle_inheritance(node: Node, ctx: &mut ParseContext) {
    let Some(from_id) = ctx.enclosing_type_scope().and_then(|s| s.symbol_id) else {
        return;
    };
    let (line, col) = line_col(node);
    let text = text_of(node, ctx.source);
    let bases = text.trim_start_matches(':').split(',');

    for base in bases {
        let cleaned = clean_base_name(base);
        if cleaned.is_empty() {
            continue;
        }
        let resolved = ctx.cache.resolve_symbol(&cleaned, &ctx.resolution);
        let relationship = Relationship::new(ctx.project_id, RelationKind::Inherits)
            .from(from_id)
            .at(line, col);
        let relationship = match resolved {
            Some(target) => relationship.to(target.id).with_confidence(1.0),
            None => relationship.unresolved(cleaned).with_confidence(1.0),
        };
        ctx.record_relationship(relationship);
    }
}

/// Strip access specifiers, `virtual`, template arguments, and namespace
/// qualification down to a simple base name (spec §4.5).
fn clean_base_name(raw: &str) -> String {
    let mut s = raw.trim();
    for prefix in ["public", "private", "protected", "virtual"] {
        s = s.trim_start().trim_start_matches(prefix);
    }
    let mut s = s.trim().to_string();
    if let Some(idx) = s.find('<') {
        s.truncate(idx);
    }
    if let Some(idx) = s.rfind("::") {
        s = s[idx + 2..].to_string();
    }
    s.trim().to_string()
}

/// `field_expression` used as an lvalue or rvalue (spec §4.5 "Field
/// read/write"). `obj.f`, `obj->f`, optionally assigned to.
pub fn handle_field_access(node: Node, ctx: &mut ParseContext) {
    let Some(field_node) = child_by_field(node, "field") else {
        return;
    };
    let field_name = text_of(field_node, ctx.source).to_string();
    let Some(from_id) = ctx.enclosing_function_id() else {
        return;
    };
    let (line, col) = line_col(node);

    let is_write = node
        .parent()
        .map(|p| {
            p.kind() == "assignment_expression"
                && child_by_field(p, "left").map(|l| l.id()) == Some(node.id())
        })
        .unwrap_or(false);

    let kind = if is_write {
        RelationKind::WritesField
    } else {
        RelationKind::ReadsField
    };

    let relationship = Relationship::new(ctx.project_id, kind)
        .from(from_id)
        .at(line, col)
        .unresolved(field_name)
        .with_confidence(0.8);
    ctx.record_relationship(relationship);
}

/// `#include` directive (spec §4.5 "Import"). The current file's implicit
/// module symbol is synthesized lazily by the caller.
pub fn handle_import(node: Node, ctx: &mut ParseContext, file_module_id: SymbolId) {
    let Some(path_node) = child_by_field(node, "path") else {
        return;
    };
    let target = text_of(path_node, ctx.source)
        .trim_matches(|c| c == '"' || c == '<' || c == '>')
        .to_string();
    let (line, col) = line_col(node);

    let relationship = Relationship::new(ctx.project_id, RelationKind::Imports)
        .from(file_module_id)
        .at(line, col)
        .unresolved(target)
        .with_confidence(1.0);
    ctx.record_relationship(relationship);
}

/// `type_identifier` / `qualified_identifier` in a signature or body (spec
/// §4.5 "Type reference").
pub fn handle_type_reference(node: Node, ctx: &mut ParseContext) {
    let name = text_of(node, ctx.source).to_string();
    if name.is_empty() || CONTROL_KEYWORDS.contains(&name.as_str()) {
        return;
    }
    let Some(from_id) = ctx
        .enclosing_function_id()
        .or_else(|| ctx.enclosing_type_scope().and_then(|s| s.symbol_id))
    else {
        return;
    };
    let (line, col) = line_col(node);
    let resolved = ctx.cache.resolve_symbol(&name, &ctx.resolution);
    let relationship = Relationship::new(ctx.project_id, RelationKind::References)
        .from(from_id)
        .at(line, col);
    let relationship = match resolved {
        Some(target) => relationship.to(target.id).with_confidence(0.5),
        None => relationship.unresolved(name).with_confidence(0.3),
    };
    ctx.record_relationship(relationship);
}
