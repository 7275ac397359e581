//! Pattern Analyzer / fallback (C6, spec §4.6): deterministic single
//! forward pass over lines, used when the grammar is unavailable, parsing
//! throws, or the driver routes an oversized file away from the AST path.
//! Output contract matches C4+C5, at a lower confidence ceiling (0.9
//! classes, 0.8 relationships).

use crate::parsing::cpp::symbols::is_log_macro;
use crate::parsing::parser::ParseInput;
use crate::relationship::{RelationKind, Relationship};
use crate::storage::{ControlFlowBlock, Pattern, PatternSeverity};
use crate::symbol::{Symbol, SymbolCounter, SymbolId};
use crate::types::{Range, SymbolKind};
use regex::Regex;
use std::sync::OnceLock;

const CLASS_CONFIDENCE: f32 = 0.9;
const RELATIONSHIP_CONFIDENCE: f32 = 0.8;

/// At most this many functions per file get pattern-based control-flow
/// analysis in the fallback path (spec §4.6 step 5).
const MAX_CONTROL_FLOW_FUNCTIONS: usize = 10;

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?:export\s+)?namespace\s+([\w:]+)\s*\{").unwrap())
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:export\s+)?(?:template\s*<[^>]*>\s*)?(class|struct)\s+(\w+)(?:\s*:\s*([^{]+))?\s*\{?")
            .unwrap()
    })
}

fn qualified_method_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[\w:<>,\s\*&]+?\s+(\w+)::(~?\w+)\s*\(([^)]*)\)\s*(const)?\s*\{?")
            .unwrap()
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[\w:<>,\s\*&]+?\s+(\w+)\s*\(([^)]*)\)\s*(const)?\s*[;{]?\s*$").unwrap()
    })
}

fn member_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:static\s+|const\s+|mutable\s+|inline\s+|constexpr\s+|thread_local\s+)*([\w:<>,\s\*&]+?)\s+(\w+)\s*(?:=\s*[^;]+)?;")
            .unwrap()
    })
}

fn control_flow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(if|for|while|do|switch|try|catch)\b").unwrap())
}

#[derive(Debug, Clone)]
struct ScopeEntry {
    kind: SymbolKind,
    simple_name: String,
    qualified_name: String,
    symbol_id: Option<SymbolId>,
    entry_depth: i32,
}

/// Join up to `lookahead` following lines onto `lines[index]` when the
/// current line opens a parameter list without closing it and a body brace
/// (spec §4.6 step 1).
fn join_multiline_signature(lines: &[&str], index: usize, lookahead: usize) -> (String, usize) {
    let mut joined = lines[index].to_string();
    if joined.contains(')') && (joined.contains('{') || joined.trim_end().ends_with(';')) {
        return (joined, 0);
    }
    let mut consumed = 0;
    for offset in 1..=lookahead {
        let Some(next) = lines.get(index + offset) else {
            break;
        };
        joined.push(' ');
        joined.push_str(next.trim());
        consumed = offset;
        if joined.contains(')') && (joined.contains('{') || joined.trim_end().ends_with(';')) {
            return (joined, consumed);
        }
    }
    if !joined.contains(')') {
        return (lines[index].to_string(), 0);
    }
    (joined, consumed)
}

fn qualify(namespace_stack: &[String], scope_stack: &[ScopeEntry], simple: &str) -> String {
    let mut segments: Vec<String> = namespace_stack.to_vec();
    segments.extend(scope_stack.iter().map(|s| s.simple_name.clone()));
    segments.push(simple.to_string());
    segments.join("::")
}

fn split_bases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|b| {
            let mut s = b.trim();
            for prefix in ["public", "private", "protected", "virtual"] {
                s = s.trim_start().trim_start_matches(prefix).trim_start();
            }
            s.split('<').next().unwrap_or(s).trim().to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn detect_name_heuristic_patterns(
    project_id: crate::types::ProjectId,
    simple_name: &str,
    symbol_id: SymbolId,
    patterns: &mut Vec<Pattern>,
) {
    let lower = simple_name.to_lowercase();
    if lower.contains("factory") || lower.contains("create") {
        patterns.push(Pattern {
            project_id,
            pattern_type: "factory".to_string(),
            pattern_name: simple_name.to_string(),
            confidence: 0.6,
            details: serde_json::json!({ "reason": "name heuristic" }),
            severity: Some(PatternSeverity::Info),
            symbol_ids: vec![symbol_id],
        });
    }
    if ["gpu", "kernel", "cuda", "opencl", "compute", "shader"]
        .iter()
        .any(|kw| lower.contains(kw))
    {
        patterns.push(Pattern {
            project_id,
            pattern_type: "gpu_execution".to_string(),
            pattern_name: simple_name.to_string(),
            confidence: 0.6,
            details: serde_json::json!({ "reason": "name heuristic" }),
            severity: Some(PatternSeverity::Info),
            symbol_ids: vec![symbol_id],
        });
    }
}

pub fn parse(
    input: &ParseInput,
    counter: &mut SymbolCounter,
    cache: &mut crate::resolution::SymbolResolutionCache,
) -> crate::storage::ParseResult {
    let mut result = crate::storage::ParseResult::default();
    let mut namespace_stack: Vec<String> = Vec::new();
    let mut namespace_entries: Vec<(usize, i32)> = Vec::new();
    let mut scope_stack: Vec<ScopeEntry> = Vec::new();
    let mut brace_depth: i32 = 0;
    let mut control_flow_analyzed = 0usize;

    let owned_lines: Vec<&str> = input.content.lines().collect();
    let mut i = 0usize;

    while i < owned_lines.len() {
        result.stats.nodes_visited += 1;
        let (line, consumed) = join_multiline_signature(&owned_lines, i, 3);
        let line_number = (i + 1) as u32;

        let line_delta = line.matches('{').count() as i32 - line.matches('}').count() as i32;

        if let Some(caps) = namespace_re().captures(&line) {
            let pushed = caps[1].split("::").count();
            for part in caps[1].split("::") {
                namespace_stack.push(part.to_string());
            }
            brace_depth += line_delta;
            namespace_entries.push((pushed, brace_depth));
        } else if let Some(caps) = class_re().captures(&line) {
            let kind = if &caps[1] == "struct" {
                SymbolKind::Struct
            } else {
                SymbolKind::Class
            };
            let simple = caps[2].to_string();
            let qualified = qualify(&namespace_stack, &scope_stack, &simple);
            let id = counter.next();
            if let Ok(symbol) = Symbol::new(
                id,
                input.project_id,
                "cpp",
                &simple,
                &qualified,
                kind,
                input.file_path,
                Range::point(line_number, 0),
            ) {
                let symbol = symbol.with_confidence(CLASS_CONFIDENCE);
                cache.add_symbol(symbol.clone()).ok();
                result.symbols.push(symbol);
                result.stats.symbols_extracted += 1;
            } else {
                result.stats.symbols_dropped += 1;
            }

            if let Some(bases) = caps.get(3) {
                for base in split_bases(bases.as_str()) {
                    let resolved = cache.resolve_symbol(
                        &base,
                        &crate::resolution::ResolutionContext::for_file(input.file_path),
                    );
                    let relationship = Relationship::new(input.project_id, RelationKind::Inherits)
                        .from(id)
                        .at(line_number, 0)
                        .with_confidence(RELATIONSHIP_CONFIDENCE);
                    let relationship = match resolved {
                        Some(target) => relationship.to(target.id),
                        None => relationship.unresolved(base),
                    };
                    result.relationships.push(relationship);
                }
            }

            brace_depth += line_delta;
            scope_stack.push(ScopeEntry {
                kind,
                simple_name: simple,
                qualified_name: qualified,
                symbol_id: Some(id),
                entry_depth: brace_depth,
            });
        } else if let Some(caps) = qualified_method_re().captures(&line) {
            let owner = caps[1].to_string();
            let simple = caps[2].to_string();
            if !is_log_macro(&simple) {
                let qualified = format!("{owner}::{simple}");
                let kind = if simple.starts_with('~') {
                    SymbolKind::Destructor
                } else if simple == owner {
                    SymbolKind::Constructor
                } else {
                    SymbolKind::Method
                };
                let parent_id = scope_stack
                    .iter()
                    .rev()
                    .find(|s| s.simple_name == owner)
                    .and_then(|s| s.symbol_id);
                emit_function(
                    input,
                    counter,
                    cache,
                    &mut result,
                    &simple,
                    &qualified,
                    kind,
                    parent_id,
                    line_number,
                    &mut control_flow_analyzed,
                    &line,
                    &owned_lines,
                    i,
                );
            }
            brace_depth += line_delta;
        } else if let Some(caps) = function_re().captures(&line) {
            let simple = caps[1].to_string();
            if !is_log_macro(&simple) && !["if", "for", "while", "switch", "catch"].contains(&simple.as_str())
            {
                let enclosing = scope_stack.last().cloned();
                let qualified = qualify(&namespace_stack, &scope_stack, &simple);
                let kind = match &enclosing {
                    Some(s) if s.simple_name == simple => SymbolKind::Constructor,
                    Some(_) => SymbolKind::Method,
                    None => SymbolKind::Function,
                };
                emit_function(
                    input,
                    counter,
                    cache,
                    &mut result,
                    &simple,
                    &qualified,
                    kind,
                    enclosing.and_then(|s| s.symbol_id),
                    line_number,
                    &mut control_flow_analyzed,
                    &line,
                    &owned_lines,
                    i,
                );
            }
            brace_depth += line_delta;
        } else if let Some(caps) = member_re().captures(&line) {
            if let Some(scope) = scope_stack.last() {
                let type_text = caps[1].trim().to_string();
                let simple = caps[2].to_string();
                let qualified = format!("{}::{}", scope.qualified_name, simple);
                let id = counter.next();
                if let Ok(symbol) = Symbol::new(
                    id,
                    input.project_id,
                    "cpp",
                    &simple,
                    &qualified,
                    SymbolKind::Field,
                    input.file_path,
                    Range::point(line_number, 0),
                ) {
                    let mut symbol = symbol.with_return_type(&type_text).with_confidence(CLASS_CONFIDENCE);
                    symbol = match symbol.with_parent(scope.symbol_id) {
                        Ok(s) => s,
                        Err(_) => {
                            result.stats.symbols_dropped += 1;
                            i += 1 + consumed;
                            continue;
                        }
                    };
                    cache.add_symbol(symbol.clone()).ok();
                    result.symbols.push(symbol);
                    result.stats.symbols_extracted += 1;
                } else {
                    result.stats.symbols_dropped += 1;
                }
            }
            brace_depth += line_delta;
        } else {
            brace_depth += line_delta;
        }

        while let Some(top) = scope_stack.last() {
            if brace_depth < top.entry_depth {
                scope_stack.pop();
            } else {
                break;
            }
        }
        while let Some(&(pushed, entry_depth)) = namespace_entries.last() {
            if brace_depth < entry_depth {
                namespace_entries.pop();
                let new_len = namespace_stack.len().saturating_sub(pushed);
                namespace_stack.truncate(new_len);
            } else {
                break;
            }
        }

        i += 1 + consumed;
    }

    result
}

#[allow(clippy::too_many_arguments)]
fn emit_function(
    input: &ParseInput,
    counter: &mut SymbolCounter,
    cache: &mut crate::resolution::SymbolResolutionCache,
    result: &mut crate::storage::ParseResult,
    simple: &str,
    qualified: &str,
    kind: SymbolKind,
    parent_id: Option<SymbolId>,
    line_number: u32,
    control_flow_analyzed: &mut usize,
    signature_line: &str,
    lines: &[&str],
    start_index: usize,
) {
    let id = counter.next();
    let Ok(mut symbol) = Symbol::new(
        id,
        input.project_id,
        "cpp",
        simple,
        qualified,
        kind,
        input.file_path,
        Range::point(line_number, 0),
    ) else {
        result.stats.symbols_dropped += 1;
        return;
    };
    symbol = symbol.with_signature(signature_line.trim());
    if let Some(parent) = parent_id {
        symbol = match symbol.with_parent(Some(parent)) {
            Ok(s) => s,
            Err(_) => {
                result.stats.symbols_dropped += 1;
                return;
            }
        };
    }
    symbol = symbol.with_confidence(CLASS_CONFIDENCE);

    cache.add_symbol(symbol.clone()).ok();
    detect_name_heuristic_patterns(input.project_id, simple, id, &mut result.patterns);
    result.symbols.push(symbol);
    result.stats.symbols_extracted += 1;

    let body_lines: Vec<&str> = lines
        .iter()
        .skip(start_index)
        .take(40)
        .copied()
        .collect();
    let body_text = body_lines.join("\n");
    let rough_score = 1 + control_flow_re().find_iter(&body_text).count();

    if rough_score >= 2 && *control_flow_analyzed < MAX_CONTROL_FLOW_FUNCTIONS {
        *control_flow_analyzed += 1;
        result.stats.complexity_checks += 1;
        result.stats.control_flow_analyzed += 1;
        result.control_flow_blocks.push(ControlFlowBlock {
            symbol_id: id,
            block_type: crate::storage::BlockType::Entry,
            start_line: line_number,
            end_line: line_number,
            condition: None,
            loop_type: None,
            complexity_contribution: 0.0,
        });
    } else {
        result.stats.complexity_checks += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseOptions;
    use crate::types::ProjectId;

    fn run(src: &str) -> crate::storage::ParseResult {
        let _ = ParseOptions::default();
        let mut counter = SymbolCounter::new();
        let mut cache = crate::resolution::SymbolResolutionCache::new(100);
        let input = ParseInput {
            file_path: "a.cpp",
            content: src,
            project_id: ProjectId::new(1).unwrap(),
        };
        parse(&input, &mut counter, &mut cache)
    }

    #[test]
    fn namespace_class_and_field_are_recognized() {
        let src = "namespace A {\nstruct S {\n  int x;\n};\n}\n";
        let result = run(src);
        let names: Vec<_> = result.symbols.iter().map(|s| s.qualified_name.to_string()).collect();
        assert!(names.iter().any(|n| n == "A::S"));
        assert!(names.iter().any(|n| n == "A::S::x"));
    }

    #[test]
    fn class_with_bases_emits_inherits_relationships() {
        let src = "class D : public B1, private B2 {\n};\n";
        let result = run(src);
        let inherits: Vec<_> = result
            .relationships
            .iter()
            .filter(|r| r.kind == RelationKind::Inherits)
            .collect();
        assert_eq!(inherits.len(), 2);
    }

    #[test]
    fn log_macro_is_not_emitted_as_a_function() {
        let src = "void LOG_INFO(const char* msg) {\n}\n";
        let result = run(src);
        assert!(result.symbols.is_empty());
    }

    #[test]
    fn factory_name_heuristic_emits_pattern() {
        let src = "Widget* createWidget() {\n  return new Widget();\n}\n";
        let result = run(src);
        assert!(result.patterns.iter().any(|p| p.pattern_type == "factory"));
    }
}
