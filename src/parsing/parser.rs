//! The per-language parser plugin interface (spec §4a language registry
//! seam) plus shared traversal guards used by every concrete parser.

use crate::config::ParseOptions;
use crate::resolution::SymbolResolutionCache;
use crate::storage::ParseResult;
use crate::symbol::SymbolCounter;
use crate::types::ProjectId;
use tree_sitter::Node;

pub struct ParseInput<'a> {
    pub file_path: &'a str,
    pub content: &'a str,
    pub project_id: ProjectId,
}

/// A concrete per-language plugin. The registry (spec §4a) holds zero or
/// more of these; only C++ is registered with a real implementation.
pub trait LanguageParser: Send + Sync {
    fn language_id(&self) -> &'static str;

    /// Attempt the AST-based path (C9 unified visitor). Returns `None` when
    /// the grammar cannot produce a usable tree, signalling the driver to
    /// fall back (spec §4.10 step 2).
    fn parse_ast(
        &self,
        input: &ParseInput,
        options: &ParseOptions,
        counter: &mut SymbolCounter,
        cache: &mut SymbolResolutionCache,
    ) -> Option<ParseResult>;

    /// The deterministic line-oriented fallback (C6), always available.
    fn parse_fallback(
        &self,
        input: &ParseInput,
        options: &ParseOptions,
        counter: &mut SymbolCounter,
        cache: &mut SymbolResolutionCache,
    ) -> ParseResult;
}

/// Maximum recursion depth for AST traversal, guarding against stack
/// overflow on deeply nested structures. 500 levels at ~4KB per frame stays
/// well within the default 2MB thread stack.
pub const MAX_AST_DEPTH: usize = 500;

/// Returns `false` once `depth` exceeds [`MAX_AST_DEPTH`]; callers should
/// stop descending into the subtree rather than panic.
#[inline]
pub fn check_recursion_depth(depth: usize, node: Node, debug_mode: bool) -> bool {
    if depth > MAX_AST_DEPTH {
        if debug_mode {
            tracing::warn!(
                line = node.start_position().row + 1,
                column = node.start_position().column + 1,
                "max AST depth ({MAX_AST_DEPTH}) exceeded, skipping subtree"
            );
        }
        return false;
    }
    true
}

