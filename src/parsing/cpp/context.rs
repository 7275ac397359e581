//! `ParseContext` (spec §4.9): the state a single file's visitor pass
//! accumulates. Explicit struct, not task-local storage, so the visitor
//! stays a plain recursive function over borrowed state.

use crate::config::ParseOptions;
use crate::relationship::Relationship;
use crate::resolution::{ResolutionContext, SymbolResolutionCache};
use crate::storage::{CallEdge, ControlFlowBlock, ParseStats, Pattern};
use crate::symbol::{Symbol, SymbolCounter, SymbolId};
use crate::types::{ProjectId, Range, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Namespace,
    Class,
    Struct,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
    pub qualified_name: String,
    /// The class/struct's own Symbol id, used as `parentSymbolId` for
    /// members declared directly within it. `None` for namespace scopes
    /// (namespace symbols never carry a parentSymbolId, spec §4.3).
    pub symbol_id: Option<SymbolId>,
}

/// Accumulated per-file parse state threaded through the unified visitor.
pub struct ParseContext<'a> {
    pub file_path: &'a str,
    pub source: &'a str,
    pub project_id: ProjectId,

    pub symbols: Vec<Symbol>,
    pub relationships: Vec<Relationship>,
    pub patterns: Vec<Pattern>,
    pub control_flow_blocks: Vec<ControlFlowBlock>,
    pub call_edges: Vec<CallEdge>,

    pub scope_stack: Vec<Scope>,
    /// Ids of the function/method bodies currently being walked, innermost
    /// last — lets relationship handlers attribute a call/field-access to
    /// the function lexically containing it instead of guessing from
    /// emission order.
    pub function_scope_stack: Vec<SymbolId>,
    pub resolution: ResolutionContext,
    pub stats: ParseStats,

    pub options: &'a ParseOptions,
    pub counter: &'a mut SymbolCounter,
    pub cache: &'a mut SymbolResolutionCache,

    pub template_depth: u32,
    /// Parameters of the `template_declaration` currently being unwrapped,
    /// taken by the first class/struct/function symbol recorded beneath it
    /// (spec §4.4 "Template").
    pub pending_template_params: Option<Vec<(String, Range)>>,
    pub inside_export_block: bool,
    pub current_access_level: Visibility,
    pub control_flow_analyzed_count: usize,

    file_module_id: Option<SymbolId>,

    /// Cooperative cancellation (spec §5 "wall-clock timeout aborts AST
    /// parsing"): checked once per visited node rather than preempted from
    /// another thread, since the visitor is pure CPU with no suspension
    /// points.
    deadline: Option<std::time::Instant>,
    pub timed_out: bool,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        file_path: &'a str,
        source: &'a str,
        project_id: ProjectId,
        options: &'a ParseOptions,
        counter: &'a mut SymbolCounter,
        cache: &'a mut SymbolResolutionCache,
    ) -> Self {
        Self {
            file_path,
            source,
            project_id,
            symbols: Vec::new(),
            relationships: Vec::new(),
            patterns: Vec::new(),
            control_flow_blocks: Vec::new(),
            call_edges: Vec::new(),
            scope_stack: Vec::new(),
            function_scope_stack: Vec::new(),
            resolution: ResolutionContext::for_file(file_path),
            stats: ParseStats::default(),
            options,
            counter,
            cache,
            template_depth: 0,
            pending_template_params: None,
            inside_export_block: false,
            current_access_level: Visibility::Private,
            control_flow_analyzed_count: 0,
            file_module_id: None,
            deadline: None,
            timed_out: false,
        }
    }

    pub fn with_deadline(mut self, deadline: std::time::Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Checked once per visited node (spec §5). Sticky: once tripped, stays
    /// tripped so the visitor can short-circuit for the rest of the walk.
    pub fn check_deadline(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        if let Some(deadline) = self.deadline {
            if std::time::Instant::now() >= deadline {
                self.timed_out = true;
            }
        }
        self.timed_out
    }

    /// The file's implicit module symbol, synthesized once on first use as
    /// the `from` side of `Imports` relationships (spec §4.5 "Import").
    pub fn ensure_file_module_id(&mut self) -> SymbolId {
        if let Some(id) = self.file_module_id {
            return id;
        }
        let id = self.counter.next();
        let symbol = Symbol::new(
            id,
            self.project_id,
            "cpp",
            self.file_path,
            self.file_path,
            crate::types::SymbolKind::Module,
            self.file_path,
            crate::types::Range::point(1, 0),
        );
        if let Ok(symbol) = symbol {
            self.record_symbol(symbol);
        }
        self.file_module_id = Some(id);
        id
    }

    pub fn push_scope(&mut self, scope: Scope) {
        if let ScopeKind::Namespace = scope.kind {
            self.resolution.current_namespace = Some(scope.qualified_name.clone());
        }
        self.scope_stack.push(scope);
    }

    pub fn pop_scope(&mut self) {
        self.scope_stack.pop();
        self.resolution.current_namespace = self
            .scope_stack
            .iter()
            .rev()
            .find(|s| matches!(s.kind, ScopeKind::Namespace))
            .map(|s| s.qualified_name.clone());
    }

    /// The innermost enclosing class/struct scope, if any — used to parent
    /// fields and methods (spec §4.4).
    pub fn enclosing_type_scope(&self) -> Option<&Scope> {
        self.scope_stack
            .iter()
            .rev()
            .find(|s| matches!(s.kind, ScopeKind::Class | ScopeKind::Struct))
    }

    pub fn push_function_scope(&mut self, symbol_id: SymbolId) {
        self.function_scope_stack.push(symbol_id);
    }

    pub fn pop_function_scope(&mut self) {
        self.function_scope_stack.pop();
    }

    /// The innermost function/method whose body textually contains the node
    /// currently being visited, if any.
    pub fn enclosing_function_id(&self) -> Option<SymbolId> {
        self.function_scope_stack.last().copied()
    }

    pub fn record_symbol(&mut self, symbol: Symbol) {
        self.cache.add_symbol(symbol.clone()).ok();
        self.symbols.push(symbol);
        self.stats.symbols_extracted += 1;
    }

    pub fn drop_invalid_symbol(&mut self) {
        self.stats.symbols_dropped += 1;
    }

    pub fn record_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }
}
