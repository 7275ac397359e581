//! End-to-end coverage of the C++ plugin's concrete behaviours: one test per
//! documented scenario, plus the universal invariants and boundary cases
//! that apply across all of them.

use cxxgraph::{
    CppParser, FileJob, LanguageDefinition, LanguageParser, LanguageRegistry, ParseInput,
    ParseOptions, ParserDriver, PersistenceSink, ProjectId, RelationKind, ResolutionCacheConfig,
    SymbolCounter, SymbolGraph, SymbolKind, SymbolResolutionCache,
};
use std::sync::Arc;

fn project_id() -> ProjectId {
    ProjectId::new(1).unwrap()
}

fn parse_ast(content: &str) -> cxxgraph::ParseResult {
    let parser = CppParser::new();
    let options = ParseOptions::default();
    let mut counter = SymbolCounter::new();
    let mut cache = SymbolResolutionCache::new(1000);
    let input = ParseInput {
        file_path: "a.cpp",
        content,
        project_id: project_id(),
    };
    parser
        .parse_ast(&input, &options, &mut counter, &mut cache)
        .expect("AST parse should succeed for well-formed input")
}

fn driver(sink: Arc<SymbolGraph>) -> ParserDriver {
    let mut registry = LanguageRegistry::new();
    registry.register(LanguageDefinition {
        id: "cpp",
        display_name: "C++",
        extensions: &["cpp"],
        parser: Arc::new(CppParser::new()),
    });
    ParserDriver::new(
        registry,
        sink,
        ParseOptions::default(),
        ResolutionCacheConfig::default(),
        project_id(),
    )
}

/// S1: nested namespace/struct/field/method qualified names, no relationships.
#[test]
fn s1_nested_namespace_and_struct_produce_qualified_symbols() {
    let result = parse_ast("namespace A { namespace B { struct S { int x; void f(); }; } }");

    let qn = |s: &cxxgraph::Symbol| s.qualified_name.as_ref().to_string();
    assert!(result
        .symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Namespace && qn(s) == "A"));
    assert!(result
        .symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Namespace && qn(s) == "A::B"));
    assert!(result
        .symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Struct && qn(s) == "A::B::S"));
    assert!(result
        .symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Field && qn(s) == "A::B::S::x"));
    assert!(result
        .symbols
        .iter()
        .any(|s| s.kind == SymbolKind::Method && qn(s).starts_with("A::B::S::f(")));
    assert!(result.relationships.is_empty());
}

/// S2: multiple inheritance, two unresolved `Inherits` edges, no `References`.
#[test]
fn s2_multiple_inheritance_emits_two_inherits_relationships() {
    let result = parse_ast("class D : public B1, private B2 { };");

    let inherits: Vec<_> = result
        .relationships
        .iter()
        .filter(|r| r.kind == RelationKind::Inherits)
        .collect();
    assert_eq!(inherits.len(), 2);
    let mut targets: Vec<&str> = inherits
        .iter()
        .filter_map(|r| r.unresolved_target())
        .collect();
    targets.sort_unstable();
    assert_eq!(targets, vec!["B1", "B2"]);
    assert!(inherits.iter().all(|r| r.confidence == 1.0));
    assert!(!result
        .relationships
        .iter()
        .any(|r| r.kind == RelationKind::References));
}

/// S3: field read, field write, and an unresolved call inside a method body.
#[test]
fn s3_method_body_emits_field_and_call_relationships() {
    let result = parse_ast("struct C { void g() { a.x = 1; int y = b->z; h(); } };");

    assert!(result.relationships.iter().any(|r| r.kind
        == RelationKind::WritesField
        && r.unresolved_target() == Some("x")));
    assert!(result
        .relationships
        .iter()
        .any(|r| r.kind == RelationKind::ReadsField && r.unresolved_target() == Some("z")));
    assert!(result
        .relationships
        .iter()
        .any(|r| r.kind == RelationKind::Calls && r.unresolved_target() == Some("h")));
}

/// S4: modifier tagging and return type on a namespace-scope variable.
#[test]
fn s4_inline_constexpr_variable_is_tagged_and_typed() {
    let result = parse_ast("inline constexpr double pi = 3.14;");

    let pi = result
        .symbols
        .iter()
        .find(|s| s.name.as_ref() == "pi")
        .expect("pi symbol");
    assert_eq!(pi.kind, SymbolKind::Variable);
    assert_eq!(pi.return_type.as_deref(), Some("double"));
    for tag in ["inline", "constexpr", "modern_cpp"] {
        assert!(pi.semantic_tags.contains(tag), "missing tag {tag}");
    }
}

/// S5: structured bindings produce one Variable symbol per name, sharing the
/// binding-group feature but each with its own index.
#[test]
fn s5_structured_binding_emits_one_variable_per_name() {
    let result = parse_ast("auto [a, b, c] = make_tuple();");

    let bindings: Vec<_> = result
        .symbols
        .iter()
        .filter(|s| s.semantic_tags.contains("structured_binding"))
        .collect();
    assert_eq!(bindings.len(), 3);
    for (index, name) in ["a", "b", "c"].iter().enumerate() {
        let symbol = bindings
            .iter()
            .find(|s| s.name.as_ref() == *name)
            .unwrap_or_else(|| panic!("missing binding {name}"));
        assert_eq!(symbol.kind, SymbolKind::Variable);
        assert_eq!(symbol.return_type.as_deref(), Some("auto"));
        assert_eq!(
            symbol.features.get("bindingIndex").and_then(|v| v.as_u64()),
            Some(index as u64)
        );
        let group = symbol
            .features
            .get("bindingVariables")
            .and_then(|v| v.as_array())
            .expect("bindingVariables array");
        assert_eq!(group.len(), 3);
    }
}

/// S6: three ifs, one for, one switch clears the complexity gate and yields
/// one entry block, one exit block, and one block per control construct in
/// source order.
#[test]
fn s6_control_heavy_function_triggers_control_flow_blocks_in_order() {
    let result = parse_ast(
        "void f(int n) {\n\
         if (n == 1) { g(); }\n\
         if (n == 2) { g(); }\n\
         if (n == 3) { g(); }\n\
         for (int i = 0; i < n; ++i) { g(); }\n\
         switch (n) { case 0: break; default: break; }\n\
         }",
    );

    assert!(result.stats.control_flow_analyzed >= 1);
    let blocks = &result.control_flow_blocks;
    assert_eq!(
        blocks
            .iter()
            .filter(|b| b.block_type == cxxgraph::BlockType::Entry)
            .count(),
        1
    );
    assert_eq!(
        blocks
            .iter()
            .filter(|b| b.block_type == cxxgraph::BlockType::Exit)
            .count(),
        1
    );
    assert_eq!(
        blocks
            .iter()
            .filter(|b| b.block_type == cxxgraph::BlockType::Conditional)
            .count(),
        3
    );
    assert_eq!(
        blocks
            .iter()
            .filter(|b| b.block_type == cxxgraph::BlockType::Loop)
            .count(),
        1
    );
    assert_eq!(
        blocks
            .iter()
            .filter(|b| b.block_type == cxxgraph::BlockType::Switch)
            .count(),
        1
    );
    let lines: Vec<u32> = blocks.iter().map(|b| b.start_line).collect();
    let mut sorted = lines.clone();
    sorted.sort_unstable();
    assert_eq!(lines, sorted, "blocks must be emitted in source order");
}

/// Complexity gate boundary: one `if` (score 2) triggers control-flow
/// analysis; zero control tokens (score 1) does not.
#[test]
fn complexity_gate_boundary_at_score_two() {
    let gated = parse_ast("void f(int n) {\n    if (n) {\n        g();\n    }\n}");
    assert!(gated.stats.control_flow_analyzed >= 1);

    let ungated = parse_ast("void f() {\n    g();\n    g();\n}");
    assert_eq!(ungated.stats.control_flow_analyzed, 0);
}

/// Empty and comment-only files: zero symbols/relationships, indexed cleanly.
#[test]
fn empty_and_comment_only_files_index_cleanly() {
    let sink = Arc::new(SymbolGraph::new());
    let driver = driver(sink.clone());

    for (path, content) in [("empty.cpp", ""), ("comments.cpp", "// just a comment\n")] {
        let job = FileJob {
            language_id: "cpp",
            file_path: path.to_string(),
            content: content.to_string(),
        };
        driver.parse_file(&job).unwrap();
        let index = sink.file_index(project_id(), path).unwrap();
        assert!(index.is_indexed);
        assert!(!index.has_errors);
        assert_eq!(index.symbol_count, 0);
        assert_eq!(index.relationship_count, 0);
    }
}

/// Files over the configured threshold route to the fallback parser even
/// though the AST grammar is available, and still extract symbols.
#[test]
fn oversized_file_routes_to_fallback() {
    let sink = Arc::new(SymbolGraph::new());
    let mut options = ParseOptions::default();
    options.large_file_threshold = 8;
    let mut registry = LanguageRegistry::new();
    registry.register(LanguageDefinition {
        id: "cpp",
        display_name: "C++",
        extensions: &["cpp"],
        parser: Arc::new(CppParser::new()),
    });
    let driver = ParserDriver::new(
        registry,
        sink.clone(),
        options,
        ResolutionCacheConfig::default(),
        project_id(),
    );
    let job = FileJob {
        language_id: "cpp",
        file_path: "big.cpp".to_string(),
        content: "class Big {\n};\n".to_string(),
    };
    driver.parse_file(&job).unwrap();
    assert!(sink.symbol_count() > 0);
}

/// Re-parsing identical content through the driver hits the parse cache and
/// does not duplicate rows in the sink.
#[test]
fn reparse_of_unchanged_content_does_not_duplicate_symbols() {
    let sink = Arc::new(SymbolGraph::new());
    let driver = driver(sink.clone());
    let job = FileJob {
        language_id: "cpp",
        file_path: "a.cpp".to_string(),
        content: "struct S { int x; };".to_string(),
    };
    driver.parse_file(&job).unwrap();
    let first = sink.symbol_count();
    driver.parse_file(&job).unwrap();
    assert_eq!(sink.symbol_count(), first);
}

/// Re-parsing a file whose content changed replaces the stale parse's
/// symbols instead of accumulating them alongside the new ones.
#[test]
fn reparse_of_changed_content_replaces_stale_symbols() {
    let sink = Arc::new(SymbolGraph::new());
    let driver = driver(sink.clone());
    let mut job = FileJob {
        language_id: "cpp",
        file_path: "a.cpp".to_string(),
        content: "struct S { int x; };".to_string(),
    };
    driver.parse_file(&job).unwrap();
    assert!(sink
        .symbols_in_file("a.cpp")
        .iter()
        .any(|s| s.name.as_ref() == "S"));

    job.content = "struct T { int y; };".to_string();
    driver.parse_file(&job).unwrap();

    let symbols = sink.symbols_in_file("a.cpp");
    assert!(symbols.iter().any(|s| s.name.as_ref() == "T"));
    assert!(!symbols.iter().any(|s| s.name.as_ref() == "S"));
    assert_eq!(sink.symbol_count(), symbols.len());
}

/// An unregistered language id surfaces as an error FileIndex, never a panic.
#[test]
fn unregistered_language_is_recorded_as_an_error_not_a_panic() {
    let sink = Arc::new(SymbolGraph::new());
    let driver = driver(sink.clone());
    let job = FileJob {
        language_id: "python",
        file_path: "a.py".to_string(),
        content: "x = 1".to_string(),
    };
    assert!(driver.parse_file(&job).is_err());
    let index = sink.file_index(project_id(), "a.py").unwrap();
    assert!(index.has_errors);
    assert!(!index.is_indexed);
}

/// The resolution cache never reports more entries than its capacity.
#[test]
fn resolution_cache_size_is_bounded_by_capacity() {
    let mut cache = SymbolResolutionCache::new(4);
    for i in 1..=10u32 {
        let id = cxxgraph::SymbolId::new(i).unwrap();
        let symbol = cxxgraph::Symbol::new(
            id,
            project_id(),
            "cpp",
            format!("s{i}"),
            format!("s{i}"),
            SymbolKind::Variable,
            "a.cpp",
            cxxgraph::Range::point(1, 0),
        )
        .unwrap();
        cache.add_symbol(symbol).ok();
    }
    assert!(cache.statistics().size <= 4);
}
