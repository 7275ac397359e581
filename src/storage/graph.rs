//! Universal graph model (spec §3) and an in-memory reference
//! [`PersistenceSink`] implementation.
//!
//! The core never talks to a relational store directly; it defines the
//! entities and the `PersistenceSink` trait, and ships `SymbolGraph` as a
//! reference sink used by tests and by callers with no real backing store.
//! `SymbolGraph::insert_symbol` is also where the cross-symbol invariants
//! deferred out of [`crate::symbol::Symbol::new`] are finally checked, since
//! only the graph has the other symbols to check against.

use crate::error::IndexError;
use crate::relationship::{RelationKind, Relationship};
use crate::symbol::{Symbol, SymbolId};
use crate::types::{CompactString, ProjectId, SymbolKind};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub project_id: ProjectId,
    pub pattern_type: String,
    pub pattern_name: String,
    pub confidence: f32,
    pub details: serde_json::Value,
    pub severity: Option<PatternSeverity>,
    pub symbol_ids: Vec<SymbolId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Entry,
    Conditional,
    Loop,
    Switch,
    Exception,
    Exit,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowBlock {
    pub symbol_id: SymbolId,
    pub block_type: BlockType,
    pub start_line: u32,
    pub end_line: u32,
    pub condition: Option<String>,
    pub loop_type: Option<String>,
    /// Contribution of this block toward the enclosing function's
    /// cyclomatic complexity (spec §4.7/§4.8).
    pub complexity_contribution: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Direct,
    Method,
    Virtual,
    FunctionPointer,
    Lambda,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller_symbol_id: SymbolId,
    pub target_name: String,
    pub resolved_callee_id: Option<SymbolId>,
    pub line: u32,
    pub column: u16,
    pub call_type: CallType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIndex {
    pub project_id: ProjectId,
    pub language_id: CompactString,
    pub file_path: String,
    pub file_hash: String,
    pub indexed_at: u64,
    pub parse_duration_ms: u64,
    pub symbol_count: usize,
    pub relationship_count: usize,
    pub pattern_count: usize,
    pub is_indexed: bool,
    pub has_errors: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseStats {
    pub nodes_visited: u64,
    pub symbols_extracted: u64,
    pub symbols_dropped: u64,
    pub complexity_checks: u64,
    pub control_flow_analyzed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub symbols: Vec<Symbol>,
    pub relationships: Vec<Relationship>,
    pub patterns: Vec<Pattern>,
    pub control_flow_blocks: Vec<ControlFlowBlock>,
    pub call_edges: Vec<CallEdge>,
    pub stats: ParseStats,
}

/// Everything downstream of the driver writes through this seam (spec §3a,
/// §6 "output contract"). A real relational store is an external
/// collaborator; the crate ships only the in-memory reference below.
pub trait PersistenceSink: Send + Sync {
    fn submit(&self, result: ParseResult) -> Result<(), IndexError>;
    fn record_file_index(&self, index: FileIndex) -> Result<(), IndexError>;

    /// Cascade-delete every symbol previously recorded for `file_path` (and
    /// any relationship, pattern, control-flow block, or call edge that
    /// referenced one), so a re-parsed file's stale rows don't accumulate
    /// alongside its fresh ones (spec §3 lifecycle: re-indexing replaces).
    fn remove_symbols_for_file(
        &self,
        project_id: ProjectId,
        file_path: &str,
    ) -> Result<(), IndexError>;
}

#[derive(Default)]
struct GraphInner {
    symbols: IndexMap<SymbolId, Symbol>,
    relationships: Vec<Relationship>,
    relationship_index: HashSet<(SymbolId, SymbolId, RelationKind)>,
    patterns: Vec<Pattern>,
    control_flow_blocks: Vec<ControlFlowBlock>,
    call_edges: Vec<CallEdge>,
    file_indexes: HashMap<(ProjectId, String), FileIndex>,
}

/// Arena-indexed in-memory implementation of [`PersistenceSink`].
///
/// Symbols form a self-referential forest via `parentSymbolId`; rather than
/// give `Symbol` an owning pointer to its parent (which would require
/// `Rc`/interior mutability for the mutable containment tree), the forest is
/// represented as integer ids into this arena (spec §9 "self-referential
/// symbol forest").
pub struct SymbolGraph {
    inner: RwLock<GraphInner>,
}

impl Default for SymbolGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolGraph {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(GraphInner::default()),
        }
    }

    /// Enforces the cross-symbol invariants of spec §3 that `Symbol::new`
    /// cannot check alone: a field's parent must be a class/struct, and a
    /// non-namespace parent must share the child's file.
    pub fn insert_symbol(&self, symbol: Symbol) -> Result<(), IndexError> {
        {
            let inner = self.inner.read();

            if symbol.kind == SymbolKind::Field {
                let parent = symbol
                    .parent_symbol_id
                    .and_then(|id| inner.symbols.get(&id));
                match parent {
                    Some(p) if p.kind.can_parent_field() => {}
                    _ => {
                        return Err(IndexError::InvalidSymbol {
                            reason: format!(
                                "field '{}' has no class/struct parent",
                                symbol.qualified_name
                            ),
                        });
                    }
                }
            }

            if let Some(parent_id) = symbol.parent_symbol_id {
                match inner.symbols.get(&parent_id) {
                    Some(parent) => {
                        if parent.kind != SymbolKind::Namespace
                            && parent.file_path != symbol.file_path
                        {
                            return Err(IndexError::InvalidSymbol {
                                reason: format!(
                                    "symbol '{}' parent is in a different file",
                                    symbol.qualified_name
                                ),
                            });
                        }
                    }
                    None => {
                        return Err(IndexError::InvalidSymbol {
                            reason: format!(
                                "symbol '{}' references unknown parentSymbolId",
                                symbol.qualified_name
                            ),
                        });
                    }
                }
            }
        }

        let mut inner = self.inner.write();
        inner.symbols.insert(symbol.id, symbol);
        Ok(())
    }

    /// Unique on `(fromSymbolId, toSymbolId, type)` when both ids are
    /// present (spec §3); duplicate inserts are a silent no-op. Unresolved
    /// relationships (no `toSymbolId`) are always appended.
    pub fn insert_relationship(&self, relationship: Relationship) {
        let mut inner = self.inner.write();
        if let (Some(from), Some(to)) = (relationship.from_symbol_id, relationship.to_symbol_id) {
            let key = (from, to, relationship.kind);
            if !inner.relationship_index.insert(key) {
                return;
            }
        }
        inner.relationships.push(relationship);
    }

    pub fn insert_pattern(&self, pattern: Pattern) {
        self.inner.write().patterns.push(pattern);
    }

    pub fn insert_control_flow_block(&self, block: ControlFlowBlock) {
        self.inner.write().control_flow_blocks.push(block);
    }

    pub fn insert_call_edge(&self, edge: CallEdge) {
        self.inner.write().call_edges.push(edge);
    }

    pub fn symbol(&self, id: SymbolId) -> Option<Symbol> {
        self.inner.read().symbols.get(&id).cloned()
    }

    pub fn symbols_in_file(&self, file_path: &str) -> Vec<Symbol> {
        self.inner
            .read()
            .symbols
            .values()
            .filter(|s| s.file_path.as_ref() == file_path)
            .cloned()
            .collect()
    }

    pub fn relationships_from(&self, id: SymbolId) -> Vec<Relationship> {
        self.inner
            .read()
            .relationships
            .iter()
            .filter(|r| r.from_symbol_id == Some(id))
            .cloned()
            .collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.inner.read().symbols.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.inner.read().relationships.len()
    }

    pub fn file_index(&self, project_id: ProjectId, file_path: &str) -> Option<FileIndex> {
        self.inner
            .read()
            .file_indexes
            .get(&(project_id, file_path.to_string()))
            .cloned()
    }
}

impl PersistenceSink for SymbolGraph {
    /// Invalid symbols are dropped and counted, never fail the submission
    /// (spec §7 `InvalidSymbol`: "symbol dropped, counted in stats, file
    /// continues").
    fn submit(&self, result: ParseResult) -> Result<(), IndexError> {
        let mut dropped = 0u64;
        for symbol in result.symbols {
            if self.insert_symbol(symbol).is_err() {
                dropped += 1;
            }
        }
        for relationship in result.relationships {
            self.insert_relationship(relationship);
        }
        for pattern in result.patterns {
            self.insert_pattern(pattern);
        }
        for block in result.control_flow_blocks {
            self.insert_control_flow_block(block);
        }
        for edge in result.call_edges {
            self.insert_call_edge(edge);
        }
        if dropped > 0 {
            tracing::debug!(dropped, "invalid symbols dropped during submission");
        }
        Ok(())
    }

    fn record_file_index(&self, index: FileIndex) -> Result<(), IndexError> {
        let key = (index.project_id, index.file_path.clone());
        self.inner.write().file_indexes.insert(key, index);
        Ok(())
    }

    fn remove_symbols_for_file(
        &self,
        project_id: ProjectId,
        file_path: &str,
    ) -> Result<(), IndexError> {
        let mut inner = self.inner.write();

        let removed_ids: HashSet<SymbolId> = inner
            .symbols
            .values()
            .filter(|s| s.project_id == project_id && s.file_path.as_ref() == file_path)
            .map(|s| s.id)
            .collect();
        if removed_ids.is_empty() {
            return Ok(());
        }

        inner
            .symbols
            .retain(|_, s| !removed_ids.contains(&s.id));

        inner.relationships.retain(|r| {
            !r.from_symbol_id.is_some_and(|id| removed_ids.contains(&id))
                && !r.to_symbol_id.is_some_and(|id| removed_ids.contains(&id))
        });
        inner
            .relationship_index
            .retain(|(from, to, _)| !removed_ids.contains(from) && !removed_ids.contains(to));

        inner
            .patterns
            .retain(|p| !p.symbol_ids.iter().any(|id| removed_ids.contains(id)));

        inner
            .control_flow_blocks
            .retain(|b| !removed_ids.contains(&b.symbol_id));

        inner
            .call_edges
            .retain(|e| !removed_ids.contains(&e.caller_symbol_id));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Range;

    fn pid() -> ProjectId {
        ProjectId::new(1).unwrap()
    }

    fn struct_symbol(id: u32, qualified: &str, file: &str) -> Symbol {
        Symbol::new(
            SymbolId::new(id).unwrap(),
            pid(),
            "cpp",
            qualified,
            qualified,
            SymbolKind::Struct,
            file,
            Range::point(1, 0),
        )
        .unwrap()
    }

    fn field_symbol(id: u32, qualified: &str, file: &str, parent: SymbolId) -> Symbol {
        Symbol::new(
            SymbolId::new(id).unwrap(),
            pid(),
            "cpp",
            qualified.rsplit("::").next().unwrap(),
            qualified,
            SymbolKind::Field,
            file,
            Range::point(2, 0),
        )
        .unwrap()
        .with_parent(Some(parent))
        .unwrap()
    }

    #[test]
    fn field_without_class_parent_is_rejected() {
        let graph = SymbolGraph::new();
        let orphan_field = Symbol::new(
            SymbolId::new(1).unwrap(),
            pid(),
            "cpp",
            "x",
            "x",
            SymbolKind::Field,
            "a.cpp",
            Range::point(1, 0),
        )
        .unwrap();
        assert!(graph.insert_symbol(orphan_field).is_err());
    }

    #[test]
    fn field_with_struct_parent_in_same_file_is_accepted() {
        let graph = SymbolGraph::new();
        let parent = struct_symbol(1, "S", "a.cpp");
        graph.insert_symbol(parent).unwrap();
        let field = field_symbol(2, "S::x", "a.cpp", SymbolId::new(1).unwrap());
        assert!(graph.insert_symbol(field).is_ok());
        assert_eq!(graph.symbol_count(), 2);
    }

    #[test]
    fn field_parent_in_different_file_is_rejected() {
        let graph = SymbolGraph::new();
        graph.insert_symbol(struct_symbol(1, "S", "a.cpp")).unwrap();
        let field = field_symbol(2, "S::x", "b.cpp", SymbolId::new(1).unwrap());
        assert!(graph.insert_symbol(field).is_err());
    }

    #[test]
    fn duplicate_relationship_is_a_no_op() {
        let graph = SymbolGraph::new();
        let rel = Relationship::new(pid(), RelationKind::Calls)
            .from(SymbolId::new(1).unwrap())
            .to(SymbolId::new(2).unwrap());
        graph.insert_relationship(rel.clone());
        graph.insert_relationship(rel);
        assert_eq!(graph.relationship_count(), 1);
    }

    #[test]
    fn remove_symbols_for_file_cascades_to_relationships_and_blocks() {
        let graph = SymbolGraph::new();
        let kept = struct_symbol(1, "Kept", "b.cpp");
        let stale = struct_symbol(2, "Stale", "a.cpp");
        graph.insert_symbol(kept).unwrap();
        graph.insert_symbol(stale).unwrap();

        graph.insert_relationship(
            Relationship::new(pid(), RelationKind::Calls)
                .from(SymbolId::new(2).unwrap())
                .to(SymbolId::new(1).unwrap()),
        );
        graph.insert_control_flow_block(ControlFlowBlock {
            symbol_id: SymbolId::new(2).unwrap(),
            block_type: BlockType::Entry,
            start_line: 1,
            end_line: 1,
            condition: None,
            loop_type: None,
            complexity_contribution: 0.0,
        });
        graph.insert_call_edge(CallEdge {
            caller_symbol_id: SymbolId::new(2).unwrap(),
            target_name: "h".to_string(),
            resolved_callee_id: None,
            line: 1,
            column: 0,
            call_type: CallType::Direct,
        });

        graph.remove_symbols_for_file(pid(), "a.cpp").unwrap();

        assert_eq!(graph.symbol_count(), 1);
        assert!(graph.symbol(SymbolId::new(1).unwrap()).is_some());
        assert!(graph.symbol(SymbolId::new(2).unwrap()).is_none());
        assert_eq!(graph.relationship_count(), 0);
        assert!(graph.inner.read().control_flow_blocks.is_empty());
        assert!(graph.inner.read().call_edges.is_empty());
    }

    #[test]
    fn submit_drops_invalid_symbols_without_failing() {
        let graph = SymbolGraph::new();
        let orphan_field = Symbol::new(
            SymbolId::new(1).unwrap(),
            pid(),
            "cpp",
            "x",
            "x",
            SymbolKind::Field,
            "a.cpp",
            Range::point(1, 0),
        )
        .unwrap();
        let result = ParseResult {
            symbols: vec![orphan_field],
            ..Default::default()
        };
        assert!(graph.submit(result).is_ok());
        assert_eq!(graph.symbol_count(), 0);
    }
}
