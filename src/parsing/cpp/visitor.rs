//! Unified Visitor (C9, spec §4.9): single-pass DFS over the tree-sitter
//! AST, dispatching each node kind to its handler in `symbols`/`relationships`.

use crate::parsing::ast_utils::{child_by_field, text_of};
use crate::parsing::cpp::context::ParseContext;
use crate::parsing::cpp::{complexity, control_flow, relationships, symbols};
use crate::parsing::parser::check_recursion_depth;
use tree_sitter::Node;

/// Run the complexity gate (C7) and, if it passes, control-flow analysis
/// (C8) over a just-recorded function's body (spec §4.9 "C9 → C7 → C8").
fn analyze_function_body(node: Node, symbol_id: crate::symbol::SymbolId, ctx: &mut ParseContext) {
    let Some(body) = child_by_field(node, "body") else {
        return;
    };
    if !ctx.options.enable_complexity {
        return;
    }

    let name = child_by_field(node, "declarator")
        .map(|d| text_of(d, ctx.source))
        .unwrap_or("");
    let body_text = text_of(body, ctx.source);
    let param_count = child_by_field(node, "declarator")
        .and_then(|d| child_by_field(d, "parameters"))
        .map(|p| {
            let mut cursor = p.walk();
            p.children(&mut cursor)
                .filter(|c| c.kind() == "parameter_declaration")
                .count() as u32
        })
        .unwrap_or(0);
    let local_variable_count = count_local_variable_declarations(body);

    let score = complexity::analyze(name, body_text, param_count, local_variable_count);
    ctx.stats.complexity_checks += 1;

    if !ctx.options.enable_control_flow || score.gate_score() < 2 {
        return;
    }
    let (blocks, edges) = control_flow::analyze(node, body, ctx.source, symbol_id);
    ctx.control_flow_blocks.extend(blocks);
    ctx.call_edges.extend(edges);
    ctx.stats.control_flow_analyzed += 1;
    ctx.control_flow_analyzed_count += 1;
}

/// Count `declaration` statements directly within a function body, not
/// descending into nested function/lambda/class bodies whose locals belong
/// to a different scope.
fn count_local_variable_declarations(body: Node) -> u32 {
    fn walk(node: Node, count: &mut u32) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "declaration" => *count += 1,
                "function_definition" | "lambda_expression" | "class_specifier" | "struct_specifier" => {}
                _ => walk(child, count),
            }
        }
    }
    let mut count = 0;
    walk(body, &mut count);
    count
}

fn is_call_function_target(node: Node) -> bool {
    node.parent()
        .map(|parent| {
            parent.kind() == "call_expression"
                && parent
                    .child_by_field_name("function")
                    .map(|f| f.id() == node.id())
                    .unwrap_or(false)
        })
        .unwrap_or(false)
}

/// Walk `node` and its subtree, recording symbols, relationships, and scope
/// transitions into `ctx`. `depth` guards against pathologically nested ASTs.
pub fn walk(node: Node, ctx: &mut ParseContext, depth: usize) {
    if !check_recursion_depth(depth, node, ctx.options.debug_mode) {
        return;
    }
    if ctx.check_deadline() {
        return;
    }
    ctx.stats.nodes_visited += 1;

    let mut pushed_scope = false;
    let mut entered_template = false;
    let mut pushed_function_scope = false;

    match node.kind() {
        "namespace_definition" => {
            if let Some(scope) = symbols::handle_namespace(node, ctx) {
                ctx.push_scope(scope);
                pushed_scope = true;
            }
        }
        "class_specifier" | "struct_specifier" => {
            if let Some(scope) = symbols::handle_class_or_struct(node, ctx) {
                ctx.push_scope(scope);
                pushed_scope = true;
            }
        }
        "function_definition" => {
            if let Some(symbol_id) = symbols::handle_function(node, ctx) {
                ctx.push_function_scope(symbol_id);
                pushed_function_scope = true;
                analyze_function_body(node, symbol_id, ctx);
            }
        }
        "field_declaration" | "parameter_declaration" | "declaration" => {
            symbols::handle_variable_or_field(node, ctx);
        }
        "enum_specifier" => {
            symbols::handle_enum(node, ctx);
        }
        "type_definition" | "alias_declaration" | "using_declaration" => {
            symbols::handle_typedef(node, ctx);
        }
        "lambda_expression" => {
            symbols::handle_lambda(node, ctx);
        }
        "call_expression" => {
            relationships::handle_call(node, ctx);
        }
        "base_class_clause" => {
            relationships::handle_inheritance(node, ctx);
        }
        "preproc_include" => {
            let file_module_id = ctx.ensure_file_module_id();
            relationships::handle_import(node, ctx, file_module_id);
        }
        "field_expression" => {
            if !is_call_function_target(node) {
                relationships::handle_field_access(node, ctx);
            }
        }
        "type_identifier" | "qualified_identifier" => {
            relationships::handle_type_reference(node, ctx);
        }
        "template_declaration" => {
            symbols::handle_template(node, ctx);
            ctx.template_depth += 1;
            entered_template = true;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, ctx, depth + 1);
    }

    if pushed_scope {
        ctx.pop_scope();
    }
    if entered_template {
        ctx.template_depth -= 1;
    }
    if pushed_function_scope {
        ctx.pop_function_scope();
    }
}
