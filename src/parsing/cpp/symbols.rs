//! Symbol Handlers (C4, spec §4.4): one function per node kind, each
//! consuming `(node, ctx)` and recording zero or more Symbols.

use crate::parsing::ast_utils::{child_by_field, node_line_column, text_of};
use crate::parsing::cpp::context::{ParseContext, Scope, ScopeKind};
use crate::parsing::cpp::qualify::qualified_name;
use crate::symbol::SymbolId;
use crate::types::{Range, SymbolKind, Visibility};
use tree_sitter::Node;

/// Logging macros that lexically resemble calls/declarations but are never
/// themselves symbol definitions (spec §4.4 edge cases).
pub(crate) const LOG_MACROS: &[&str] = &["LOG_INFO", "LOG_ERROR", "LOG_WARN", "LOG_DEBUG", "LOG_TRACE"];

/// Control keywords that must never be recorded as call targets (spec §4.4).
pub const CONTROL_KEYWORDS: &[&str] = &[
    "if", "while", "for", "switch", "catch", "sizeof", "typeof", "return",
];

pub(crate) fn is_log_macro(name: &str) -> bool {
    LOG_MACROS.contains(&name)
}

fn range_of(node: Node) -> Range {
    let (sl, sc, el, ec) = node_line_column(node);
    Range::new(sl, sc, el, ec)
}

/// Descend through pointer/reference/function/array declarator wrappers to
/// the innermost name-bearing node.
fn innermost_identifier(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "field_identifier" | "qualified_identifier" | "destructor_name"
        | "operator_name" => Some(node),
        "pointer_declarator" | "reference_declarator" | "array_declarator"
        | "parenthesized_declarator" | "init_declarator" => {
            child_by_field(node, "declarator").and_then(innermost_identifier)
        }
        "function_declarator" => {
            child_by_field(node, "declarator").and_then(innermost_identifier)
        }
        _ => None,
    }
}

/// `namespace_definition` (spec §4.4 "Namespace"). Returns the scope to
/// push; the visitor pops it once the subtree is done.
pub fn handle_namespace(node: Node, ctx: &mut ParseContext) -> Option<Scope> {
    let name_node = child_by_field(node, "name")?;
    let simple = text_of(name_node, ctx.source).to_string();
    let qualified = qualified_name(node, ctx.source, &simple);

    let id = ctx.counter.next();
    let symbol = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        SymbolKind::Namespace,
        ctx.file_path,
        range_of(node),
    );

    match symbol {
        Ok(symbol) => ctx.record_symbol(symbol),
        Err(_) => ctx.drop_invalid_symbol(),
    }

    Some(Scope {
        kind: ScopeKind::Namespace,
        name: simple,
        qualified_name: qualified,
        symbol_id: None,
    })
}

/// `class_specifier` / `struct_specifier` (spec §4.4 "Class/Struct").
pub fn handle_class_or_struct(node: Node, ctx: &mut ParseContext) -> Option<Scope> {
    let name_node = child_by_field(node, "name")?;
    let simple = text_of(name_node, ctx.source).to_string();
    let qualified = qualified_name(node, ctx.source, &simple);
    let kind = if node.kind() == "struct_specifier" {
        SymbolKind::Struct
    } else {
        SymbolKind::Class
    };

    let id = ctx.counter.next();
    let mut symbol = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        kind,
        ctx.file_path,
        range_of(node),
    )
    .ok()?;
    symbol = symbol.set_exported(ctx.inside_export_block);

    let symbol_id = symbol.id;
    if let Some(params) = ctx.pending_template_params.take() {
        symbol = tag_as_template(symbol, &params);
        ctx.record_symbol(symbol);
        emit_template_parameters(ctx, symbol_id, &qualified, params);
    } else {
        ctx.record_symbol(symbol);
    }

    Some(Scope {
        kind: if kind == SymbolKind::Struct {
            ScopeKind::Struct
        } else {
            ScopeKind::Class
        },
        name: simple,
        qualified_name: qualified,
        symbol_id: Some(symbol_id),
    })
}

/// `template<...> class/struct/function` (spec §4.4 "Template"). Tags the
/// wrapped symbol `template` and emits one `Parameter` symbol per template
/// parameter, parented to it. `node` is the `template_declaration`.
fn extract_template_parameters(node: Node, ctx: &ParseContext) -> Vec<(String, Range)> {
    let Some(list) = child_by_field(node, "parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = list.walk();
    for param in list.children(&mut cursor) {
        if !matches!(
            param.kind(),
            "type_parameter_declaration"
                | "variadic_type_parameter_declaration"
                | "optional_type_parameter_declaration"
                | "parameter_declaration"
                | "optional_parameter_declaration"
                | "variadic_parameter_declaration"
                | "template_template_parameter_declaration"
        ) {
            continue;
        }
        let name = child_by_field(param, "name")
            .map(|n| text_of(n, ctx.source).to_string())
            .or_else(|| {
                child_by_field(param, "declarator")
                    .and_then(innermost_identifier)
                    .map(|n| text_of(n, ctx.source).to_string())
            })
            .or_else(|| {
                let mut inner = param.walk();
                param
                    .children(&mut inner)
                    .find(|n| matches!(n.kind(), "type_identifier" | "identifier"))
                    .map(|n| text_of(n, ctx.source).to_string())
            });
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            out.push((name, range_of(param)));
        }
    }
    out
}

fn tag_as_template(symbol: crate::symbol::Symbol, params: &[(String, Range)]) -> crate::symbol::Symbol {
    let names_json: Vec<serde_json::Value> = params
        .iter()
        .map(|(n, _)| serde_json::Value::String(n.clone()))
        .collect();
    symbol
        .tag("template")
        .with_feature("templateParameters", serde_json::Value::Array(names_json))
}

fn emit_template_parameters(
    ctx: &mut ParseContext,
    parent_id: SymbolId,
    parent_qualified: &str,
    params: Vec<(String, Range)>,
) {
    for (name, range) in params {
        let qualified = format!("{parent_qualified}::{name}");
        let id = ctx.counter.next();
        let result = crate::symbol::Symbol::new(
            id,
            ctx.project_id,
            "cpp",
            &name,
            &qualified,
            SymbolKind::Parameter,
            ctx.file_path,
            range,
        );
        match result {
            Ok(symbol) => match symbol.with_parent(Some(parent_id)) {
                Ok(symbol) => ctx.record_symbol(symbol),
                Err(_) => ctx.drop_invalid_symbol(),
            },
            Err(_) => ctx.drop_invalid_symbol(),
        }
    }
}

/// `template_declaration` (spec §4.4 "Template"): stashes its parameters so
/// the next class/struct/function symbol recorded beneath it can claim them.
pub fn handle_template(node: Node, ctx: &mut ParseContext) {
    let params = extract_template_parameters(node, ctx);
    if !params.is_empty() {
        ctx.pending_template_params = Some(params);
    }
}

/// `function_definition`, and `field_declaration`/`declaration` whose
/// declarator is a `function_declarator` (method/function declared without
/// a body) — spec §4.4 "Function/Method".
pub fn handle_function(node: Node, ctx: &mut ParseContext) -> Option<SymbolId> {
    let declarator = child_by_field(node, "declarator")?;
    let name_node = innermost_identifier(declarator)?;
    let simple = text_of(name_node, ctx.source).to_string();
    if is_log_macro(&simple) {
        return None;
    }

    let func_declarator = find_function_declarator(declarator).unwrap_or(declarator);
    let params_text = child_by_field(func_declarator, "parameters")
        .map(|p| text_of(p, ctx.source))
        .unwrap_or("()");
    let is_const = text_of(func_declarator, ctx.source).contains(") const");

    let return_type = child_by_field(node, "type")
        .map(|t| text_of(t, ctx.source).to_string())
        .unwrap_or_else(|| "void".to_string());

    let enclosing_type = ctx.enclosing_type_scope().cloned();
    let parent_simple_name = enclosing_type.as_ref().map(|s| s.name.clone());

    let kind = match (&parent_simple_name, simple.starts_with('~')) {
        (Some(parent), true) if simple.trim_start_matches('~') == parent => SymbolKind::Destructor,
        (Some(parent), false) if &simple == parent => SymbolKind::Constructor,
        (Some(_), _) => SymbolKind::Method,
        (None, _) => SymbolKind::Function,
    };

    let qualified = qualified_name(node, ctx.source, &simple);
    let param_signature: String = params_text.chars().filter(|c| !c.is_whitespace()).collect();
    let qualified_with_overload = format!("{qualified}({param_signature})");

    let signature = format!(
        "{simple}{params_text}{}",
        if is_const { " const" } else { "" }
    );

    let id = ctx.counter.next();
    let result = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified_with_overload,
        kind,
        ctx.file_path,
        range_of(node),
    );

    let mut symbol = match result {
        Ok(s) => s,
        Err(_) => {
            ctx.drop_invalid_symbol();
            return None;
        }
    };
    symbol = symbol.with_signature(&signature);
    if kind != SymbolKind::Constructor && kind != SymbolKind::Destructor {
        symbol = symbol.with_return_type(&return_type);
    }
    if let Some(scope) = &enclosing_type {
        symbol = match symbol.with_parent(scope.symbol_id) {
            Ok(s) => s,
            Err(_) => {
                ctx.drop_invalid_symbol();
                return None;
            }
        };
    }
    symbol = symbol.with_confidence(1.0);
    if let Some(params) = ctx.pending_template_params.take() {
        symbol = tag_as_template(symbol, &params);
        ctx.record_symbol(symbol);
        emit_template_parameters(ctx, id, &qualified_with_overload, params);
    } else {
        ctx.record_symbol(symbol);
    }
    Some(id)
}

fn find_function_declarator(node: Node) -> Option<Node> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    child_by_field(node, "declarator").and_then(find_function_declarator)
}

/// `field_declaration` / `parameter_declaration` / `declaration` (spec
/// §4.4 "Variable/Field") including structured bindings.
pub fn handle_variable_or_field(node: Node, ctx: &mut ParseContext) {
    // A declaration whose declarator bottoms out in a function_declarator
    // is a method/function prototype, not a data member.
    if let Some(declarator) = child_by_field(node, "declarator") {
        if find_function_declarator(declarator).is_some() && innermost_identifier(declarator).is_some()
        {
            handle_function(node, ctx);
            return;
        }
    }

    if let Some(binding) = first_structured_binding(node) {
        handle_structured_binding(node, binding, ctx);
        return;
    }

    let declarator = match child_by_field(node, "declarator") {
        Some(d) => d,
        None => return,
    };
    let Some(name_node) = innermost_identifier(declarator) else {
        return;
    };
    let simple = text_of(name_node, ctx.source).to_string();

    let enclosing_type = ctx.enclosing_type_scope().cloned();
    let kind = if node.kind() == "field_declaration" && enclosing_type.is_some() {
        SymbolKind::Field
    } else {
        SymbolKind::Variable
    };

    let declaration_text = text_of(node, ctx.source);
    let type_node = child_by_field(node, "type");
    let type_text = type_node
        .map(|t| text_of(t, ctx.source).to_string())
        .unwrap_or_default();

    let qualified = qualified_name(node, ctx.source, &simple);
    let id = ctx.counter.next();
    let result = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        kind,
        ctx.file_path,
        range_of(node),
    );
    let mut symbol = match result {
        Ok(s) => s,
        Err(_) => {
            ctx.drop_invalid_symbol();
            return;
        }
    };
    if !type_text.is_empty() {
        symbol = symbol.with_return_type(&type_text);
    }
    if kind == SymbolKind::Field {
        if let Some(scope) = &enclosing_type {
            symbol = match symbol.with_parent(scope.symbol_id) {
                Ok(s) => s,
                Err(_) => {
                    ctx.drop_invalid_symbol();
                    return;
                }
            };
        }
    }

    symbol = tag_modifiers(symbol, node, declaration_text, ctx.source);
    ctx.record_symbol(symbol);
}

/// AST-node-type detection first, substring fallback second (spec §4.4
/// "modifier detection").
fn tag_modifiers(
    mut symbol: crate::symbol::Symbol,
    node: Node,
    declaration_text: &str,
    source: &str,
) -> crate::symbol::Symbol {
    let mut cursor = node.walk();
    let mut saw_storage_specifier = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "storage_class_specifier" => {
                saw_storage_specifier = true;
                let text = text_of(child, source);
                symbol = symbol.tag(text);
            }
            "type_qualifier" => {
                let text = text_of(child, source);
                symbol = symbol.tag(text);
            }
            _ => {}
        }
    }

    if text_of(node, source).contains("constexpr") && !declaration_text_has_tag(&symbol, "constexpr")
    {
        symbol = symbol.tag("constexpr");
    }

    for keyword in ["inline", "const", "static", "thread_local", "extern", "mutable"] {
        if !saw_storage_specifier && declaration_text.contains(keyword) {
            symbol = symbol.tag(keyword);
        }
    }

    if symbol.semantic_tags.contains("inline") {
        symbol = symbol.tag("modern_cpp");
    }
    symbol
}

fn declaration_text_has_tag(symbol: &crate::symbol::Symbol, tag: &str) -> bool {
    symbol.semantic_tags.contains(tag)
}

fn first_structured_binding(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .find(|c| c.kind() == "structured_binding_declarator")
}

/// `auto [a, b, c] = …;` (spec §4.4 "Structured binding").
fn handle_structured_binding(node: Node, binding: Node, ctx: &mut ParseContext) {
    let mut names = Vec::new();
    let mut cursor = binding.walk();
    for child in binding.children(&mut cursor) {
        if child.kind() == "identifier" {
            names.push(text_of(child, ctx.source).to_string());
        }
    }
    if names.is_empty() {
        return;
    }

    let names_json: Vec<serde_json::Value> =
        names.iter().map(|n| serde_json::Value::String(n.clone())).collect();

    for (index, name) in names.iter().enumerate() {
        let qualified = qualified_name(node, ctx.source, name);
        let id = ctx.counter.next();
        let result = crate::symbol::Symbol::new(
            id,
            ctx.project_id,
            "cpp",
            name,
            &qualified,
            SymbolKind::Variable,
            ctx.file_path,
            range_of(node),
        );
        let mut symbol = match result {
            Ok(s) => s,
            Err(_) => {
                ctx.drop_invalid_symbol();
                continue;
            }
        };
        symbol = symbol
            .with_return_type("auto")
            .tag("structured_binding")
            .tag("auto_deduced")
            .tag("modern_cpp")
            .with_feature("bindingVariables", serde_json::Value::Array(names_json.clone()))
            .with_feature("bindingIndex", serde_json::Value::from(index));
        ctx.record_symbol(symbol);
    }
}

/// `enum_specifier` (spec §4.4 "Enum"). Enumerators become child variables.
pub fn handle_enum(node: Node, ctx: &mut ParseContext) {
    let name_node = child_by_field(node, "name");
    let simple = name_node
        .map(|n| text_of(n, ctx.source).to_string())
        .unwrap_or_else(|| format!("anonymous_enum_{}", node.start_position().row + 1));
    let qualified = qualified_name(node, ctx.source, &simple);

    let id = ctx.counter.next();
    let result = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        SymbolKind::Enum,
        ctx.file_path,
        range_of(node),
    );
    let enum_symbol_id = id;
    match result {
        Ok(symbol) => ctx.record_symbol(symbol),
        Err(_) => {
            ctx.drop_invalid_symbol();
            return;
        }
    }

    if let Some(body) = child_by_field(node, "body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "enumerator" {
                if let Some(enumerator_name) = child_by_field(child, "name") {
                    let enum_value_name = text_of(enumerator_name, ctx.source).to_string();
                    let enum_value_qualified = qualified_name(child, ctx.source, &enum_value_name);
                    let value_id = ctx.counter.next();
                    if let Ok(mut value_symbol) = crate::symbol::Symbol::new(
                        value_id,
                        ctx.project_id,
                        "cpp",
                        &enum_value_name,
                        &enum_value_qualified,
                        SymbolKind::Variable,
                        ctx.file_path,
                        range_of(child),
                    ) {
                        value_symbol = match value_symbol.with_parent(Some(enum_symbol_id)) {
                            Ok(s) => s,
                            Err(_) => {
                                ctx.drop_invalid_symbol();
                                continue;
                            }
                        };
                        ctx.record_symbol(value_symbol);
                    } else {
                        ctx.drop_invalid_symbol();
                    }
                }
            }
        }
    }
}

/// `type_definition` / `alias_declaration` / `using namespace …` (spec
/// §4.4 "Typedef/alias").
pub fn handle_typedef(node: Node, ctx: &mut ParseContext) {
    if node.kind() == "using_declaration" {
        let text = text_of(node, ctx.source);
        if let Some(rest) = text.trim_end_matches(';').strip_prefix("using namespace ") {
            ctx.resolution
                .imported_namespaces
                .push(rest.trim().to_string());
        }
        return;
    }

    let (simple, aliased_type) = match node.kind() {
        "alias_declaration" => {
            let name = child_by_field(node, "name")
                .map(|n| text_of(n, ctx.source).to_string())
                .unwrap_or_default();
            let value = child_by_field(node, "type")
                .map(|n| text_of(n, ctx.source).to_string())
                .unwrap_or_default();
            (name, value)
        }
        _ => {
            let declarator = child_by_field(node, "declarator");
            let name = declarator
                .and_then(innermost_identifier)
                .map(|n| text_of(n, ctx.source).to_string())
                .unwrap_or_default();
            let value = child_by_field(node, "type")
                .map(|n| text_of(n, ctx.source).to_string())
                .unwrap_or_default();
            (name, value)
        }
    };
    if simple.is_empty() {
        return;
    }

    let qualified = qualified_name(node, ctx.source, &simple);
    let id = ctx.counter.next();
    let result = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        SymbolKind::Typedef,
        ctx.file_path,
        range_of(node),
    );
    match result {
        Ok(mut symbol) => {
            if !aliased_type.is_empty() {
                symbol = symbol.with_return_type(&aliased_type);
                ctx.resolution
                    .type_aliases
                    .insert(simple, aliased_type);
            }
            ctx.record_symbol(symbol);
        }
        Err(_) => ctx.drop_invalid_symbol(),
    }
}

/// Synthetic lambda symbol (spec §4.4 "Lambda").
pub fn handle_lambda(node: Node, ctx: &mut ParseContext) {
    let (line, col, _, _) = node_line_column(node);
    let simple = format!("lambda_{line}_{col}");
    let qualified = qualified_name(node, ctx.source, &simple);

    let captures = child_by_field(node, "captures")
        .map(|c| text_of(c, ctx.source))
        .unwrap_or("[]");
    let declarator = child_by_field(node, "declarator");
    let params = declarator
        .and_then(|d| child_by_field(d, "parameters"))
        .map(|p| text_of(p, ctx.source))
        .unwrap_or("()");
    let signature = format!("{captures}{params}");

    let id = ctx.counter.next();
    let result = crate::symbol::Symbol::new(
        id,
        ctx.project_id,
        "cpp",
        &simple,
        &qualified,
        SymbolKind::Lambda,
        ctx.file_path,
        range_of(node),
    );
    match result {
        Ok(symbol) => ctx.record_symbol(symbol.with_signature(&signature)),
        Err(_) => ctx.drop_invalid_symbol(),
    }
}

pub fn visibility_from_keyword(keyword: &str) -> Option<Visibility> {
    match keyword {
        "public" => Some(Visibility::Public),
        "private" => Some(Visibility::Private),
        "protected" => Some(Visibility::Protected),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::resolution::SymbolResolutionCache;
    use crate::symbol::SymbolCounter;
    use crate::types::ProjectId;
    use tree_sitter::Parser;

    fn visit_and_collect(src: &str) -> Vec<crate::symbol::Symbol> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .unwrap();
        let tree = parser.parse(src, None).unwrap();
        let options = ParseOptions::default();
        let mut counter = SymbolCounter::new();
        let mut cache = SymbolResolutionCache::new(100);
        let mut ctx = ParseContext::new(
            "a.cpp",
            src,
            ProjectId::new(1).unwrap(),
            &options,
            &mut counter,
            &mut cache,
        );
        crate::parsing::cpp::visitor::walk(tree.root_node(), &mut ctx, 0);
        ctx.symbols
    }

    #[test]
    fn nested_namespace_struct_field_and_method() {
        let symbols =
            visit_and_collect("namespace A { namespace B { struct S { int x; void f(); }; } }");
        let qualified: Vec<_> = symbols.iter().map(|s| s.qualified_name.to_string()).collect();
        assert!(qualified.contains(&"A".to_string()));
        assert!(qualified.contains(&"A::B".to_string()));
        assert!(qualified.iter().any(|q| q.starts_with("A::B::S::x")));
        assert!(qualified.iter().any(|q| q.starts_with("A::B::S::f")));
    }

    #[test]
    fn structured_binding_emits_three_tagged_variables() {
        let symbols = visit_and_collect("auto [a, b, c] = make_tuple();");
        assert_eq!(symbols.len(), 3);
        for s in &symbols {
            assert!(s.semantic_tags.contains("structured_binding"));
            assert_eq!(s.return_type.as_deref(), Some("auto"));
        }
    }

    #[test]
    fn inline_constexpr_variable_is_tagged_modern_cpp() {
        let symbols = visit_and_collect("inline constexpr double pi = 3.14;");
        let pi = symbols.iter().find(|s| s.name.as_ref() == "pi").unwrap();
        assert!(pi.semantic_tags.contains("inline"));
        assert!(pi.semantic_tags.contains("constexpr"));
        assert!(pi.semantic_tags.contains("modern_cpp"));
    }

    #[test]
    fn log_macro_is_not_recorded_as_a_function() {
        let symbols = visit_and_collect("void LOG_INFO(const char* msg) { }");
        assert!(symbols.is_empty());
    }

    #[test]
    fn template_class_emits_tagged_symbol_and_parameter_children() {
        let symbols = visit_and_collect("template<typename T> class Box { T value; };");
        let class = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Class && s.name.as_ref() == "Box")
            .unwrap();
        assert!(class.semantic_tags.contains("template"));

        let param = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Parameter && s.name.as_ref() == "T")
            .unwrap();
        assert_eq!(param.parent_symbol_id, Some(class.id));
    }

    #[test]
    fn template_function_emits_tagged_symbol_and_parameter_children() {
        let symbols = visit_and_collect("template<typename U> U identity(U x) { return x; }");
        let function = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Function && s.name.as_ref() == "identity")
            .unwrap();
        assert!(function.semantic_tags.contains("template"));

        let param = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Parameter && s.name.as_ref() == "U")
            .unwrap();
        assert_eq!(param.parent_symbol_id, Some(function.id));
    }

    #[test]
    fn non_template_class_is_not_tagged_template() {
        let symbols = visit_and_collect("class Plain { int x; };");
        let class = symbols
            .iter()
            .find(|s| s.kind == SymbolKind::Class)
            .unwrap();
        assert!(!class.semantic_tags.contains("template"));
        assert!(!symbols.iter().any(|s| s.kind == SymbolKind::Parameter));
    }
}
