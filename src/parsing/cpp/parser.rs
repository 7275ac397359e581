//! `CppParser` (C10's per-language half): grammar load-once, AST visitor
//! entry point, and the deterministic fallback.

use crate::config::ParseOptions;
use crate::parsing::cpp::{fallback, visitor};
use crate::parsing::cpp::context::ParseContext;
use crate::parsing::parser::{LanguageParser, ParseInput};
use crate::resolution::SymbolResolutionCache;
use crate::storage::ParseResult;
use crate::symbol::SymbolCounter;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tree_sitter::{Language, Parser};

fn cpp_language() -> &'static Language {
    static LANGUAGE: OnceLock<Language> = OnceLock::new();
    LANGUAGE.get_or_init(|| tree_sitter_cpp::LANGUAGE.into())
}

#[derive(Debug, Default)]
pub struct CppParser;

impl CppParser {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageParser for CppParser {
    fn language_id(&self) -> &'static str {
        "cpp"
    }

    fn parse_ast(
        &self,
        input: &ParseInput,
        options: &ParseOptions,
        counter: &mut SymbolCounter,
        cache: &mut SymbolResolutionCache,
    ) -> Option<ParseResult> {
        let mut parser = Parser::new();
        parser.set_language(cpp_language()).ok()?;
        let tree = parser.parse(input.content, None)?;
        if tree.root_node().has_error() {
            tracing::debug!(file = input.file_path, "AST has parse errors, using anyway");
        }

        let deadline = Instant::now() + Duration::from_millis(options.parse_timeout_ms.max(1));
        let mut ctx = ParseContext::new(
            input.file_path,
            input.content,
            input.project_id,
            options,
            counter,
            cache,
        )
        .with_deadline(deadline);
        visitor::walk(tree.root_node(), &mut ctx, 0);

        if ctx.timed_out {
            tracing::warn!(
                error = %crate::error::IndexError::ParseTimeout {
                    path: std::path::PathBuf::from(input.file_path),
                    timeout_ms: options.parse_timeout_ms,
                },
                "AST parse exceeded deadline, falling back"
            );
            return None;
        }

        Some(ParseResult {
            symbols: ctx.symbols,
            relationships: ctx.relationships,
            patterns: ctx.patterns,
            control_flow_blocks: ctx.control_flow_blocks,
            call_edges: ctx.call_edges,
            stats: ctx.stats,
        })
    }

    fn parse_fallback(
        &self,
        input: &ParseInput,
        _options: &ParseOptions,
        counter: &mut SymbolCounter,
        cache: &mut SymbolResolutionCache,
    ) -> ParseResult {
        fallback::parse(input, counter, cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::SymbolResolutionCache;
    use crate::types::ProjectId;

    #[test]
    fn ast_path_extracts_a_struct_and_a_method() {
        let parser = CppParser::new();
        let options = ParseOptions::default();
        let mut counter = SymbolCounter::new();
        let mut cache = SymbolResolutionCache::new(100);
        let input = ParseInput {
            file_path: "a.cpp",
            content: "struct S { void f(); };",
            project_id: ProjectId::new(1).unwrap(),
        };
        let result = parser
            .parse_ast(&input, &options, &mut counter, &mut cache)
            .unwrap();
        assert!(result.symbols.iter().any(|s| s.qualified_name.as_ref() == "S"));
        assert!(result
            .symbols
            .iter()
            .any(|s| s.qualified_name.as_ref().starts_with("S::f")));
    }

    #[test]
    fn fallback_path_extracts_a_class() {
        let parser = CppParser::new();
        let options = ParseOptions::default();
        let mut counter = SymbolCounter::new();
        let mut cache = SymbolResolutionCache::new(100);
        let input = ParseInput {
            file_path: "a.cpp",
            content: "class C {\n};\n",
            project_id: ProjectId::new(1).unwrap(),
        };
        let result = parser.parse_fallback(&input, &options, &mut counter, &mut cache);
        assert!(result.symbols.iter().any(|s| s.qualified_name.as_ref() == "C"));
    }
}
