//! The universal `Symbol` entity (spec §3) and the invariants its smart
//! constructors enforce.
//!
//! Per the design notes (spec §9, "Self-referential symbol forest → arena +
//! integer ids"), `Symbol` itself stays a plain, cheaply-cloned value type.
//! The invariants that need cross-symbol context (field-must-have-a-class-or-
//! struct-parent, parent-file-must-match) are enforced by
//! [`crate::storage::graph::SymbolGraph::insert_symbol`] at arena-insertion
//! time, not here; the invariants knowable from the symbol alone are enforced
//! in [`Symbol::new`].

use crate::error::IndexError;
use crate::types::{CompactString, ProjectId, Range, SymbolKind, Visibility, compact_string};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use crate::types::SymbolId;

/// Counter for minting fresh `SymbolId`s within one parse/indexing run.
#[derive(Debug, Default)]
pub struct SymbolCounter(u32);

impl SymbolCounter {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn next(&mut self) -> SymbolId {
        self.0 += 1;
        SymbolId::new(self.0).expect("counter starts at 1, never produces 0")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub project_id: ProjectId,
    pub language_id: CompactString,
    pub name: CompactString,
    pub qualified_name: CompactString,
    pub kind: SymbolKind,
    pub file_path: CompactString,
    pub range: Range,
    pub return_type: Option<CompactString>,
    pub signature: Option<CompactString>,
    pub visibility: Option<Visibility>,
    pub namespace: Option<CompactString>,
    pub parent_symbol_id: Option<SymbolId>,
    pub is_exported: bool,
    pub is_async: bool,
    pub is_abstract: bool,
    /// Opaque language-specific feature bag (spec §3: "language-specific features").
    pub features: std::collections::BTreeMap<String, serde_json::Value>,
    /// Lowercase tokens, e.g. `template`, `virtual`, `inline`, `modern_cpp`.
    pub semantic_tags: BTreeSet<String>,
    /// In `[0, 1]`: 1.0 when AST-derived with every clue present, lower on fallback.
    pub confidence: f32,
}

impl Symbol {
    /// Construct a Symbol, enforcing the invariants that are knowable in
    /// isolation (spec §3, §9). Cross-symbol invariants (field/parent kind,
    /// same-file-or-namespace parent) are checked on insertion into the graph.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SymbolId,
        project_id: ProjectId,
        language_id: impl AsRef<str>,
        name: impl AsRef<str>,
        qualified_name: impl AsRef<str>,
        kind: SymbolKind,
        file_path: impl AsRef<str>,
        range: Range,
    ) -> Result<Self, IndexError> {
        let name = name.as_ref();
        let qualified_name = qualified_name.as_ref();

        let symbol = Self {
            id,
            project_id,
            language_id: compact_string(language_id),
            name: compact_string(name),
            qualified_name: compact_string(qualified_name),
            kind,
            file_path: compact_string(file_path),
            range,
            return_type: None,
            signature: None,
            visibility: None,
            namespace: None,
            parent_symbol_id: None,
            is_exported: false,
            is_async: false,
            is_abstract: false,
            features: Default::default(),
            semantic_tags: Default::default(),
            confidence: 1.0,
        };

        symbol.validate_self_contained()?;
        Ok(symbol)
    }

    /// Invariants checkable without consulting other symbols.
    fn validate_self_contained(&self) -> Result<(), IndexError> {
        // "constructing a Symbol with parentSymbolId set but kind=namespace
        // fails with InvalidSymbol" (spec §4.3 example). Namespace nesting is
        // expressed through `qualifiedName`/`namespace`, not a parent pointer.
        if self.kind == SymbolKind::Namespace && self.parent_symbol_id.is_some() {
            return Err(IndexError::InvalidSymbol {
                reason: "namespace symbols may not carry a parentSymbolId".into(),
            });
        }

        if let Some(ns) = &self.namespace {
            if !self.qualified_name.starts_with(ns.as_ref()) {
                return Err(IndexError::InvalidSymbol {
                    reason: format!(
                        "qualifiedName '{}' does not start with namespace '{}'",
                        self.qualified_name, ns
                    ),
                });
            }
        }

        if self.kind == SymbolKind::Constructor || self.kind == SymbolKind::Destructor {
            // Name shape is checked by the C++ symbol handlers, which know the
            // parent class name; nothing enforceable here in isolation.
        }

        Ok(())
    }

    pub fn with_parent(mut self, parent_symbol_id: Option<SymbolId>) -> Result<Self, IndexError> {
        self.parent_symbol_id = parent_symbol_id;
        self.validate_self_contained()?;
        Ok(self)
    }

    pub fn with_namespace(mut self, namespace: Option<impl AsRef<str>>) -> Result<Self, IndexError> {
        self.namespace = namespace.map(compact_string);
        self.validate_self_contained()?;
        Ok(self)
    }

    pub fn with_signature(mut self, signature: impl AsRef<str>) -> Self {
        self.signature = Some(compact_string(signature));
        self
    }

    pub fn with_return_type(mut self, return_type: impl AsRef<str>) -> Self {
        self.return_type = Some(compact_string(return_type));
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.semantic_tags.insert(tag.into().to_lowercase());
        self
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.features.insert(key.into(), value);
        self
    }

    pub fn set_exported(mut self, is_exported: bool) -> Self {
        self.is_exported = is_exported;
        self
    }

    pub fn set_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn set_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// The simple (unqualified) last segment of `qualifiedName`.
    pub fn simple_name_from_qualified(&self) -> &str {
        self.qualified_name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Uniqueness key per spec §3: `(language, qualifiedName, filePath, line)`.
    pub fn identity_key(&self) -> (String, String, String, u32) {
        (
            self.language_id.to_string(),
            self.qualified_name.to_string(),
            self.file_path.to_string(),
            self.range.start_line,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid() -> ProjectId {
        ProjectId::new(1).unwrap()
    }

    #[test]
    fn namespace_with_parent_is_invalid() {
        let id = SymbolId::new(1).unwrap();
        let sym = Symbol::new(
            id,
            pid(),
            "cpp",
            "B",
            "A::B",
            SymbolKind::Namespace,
            "a.cpp",
            Range::point(1, 0),
        )
        .unwrap();

        let err = sym.with_parent(Some(SymbolId::new(2).unwrap()));
        assert!(err.is_err());
    }

    #[test]
    fn qualified_name_must_start_with_namespace() {
        let id = SymbolId::new(1).unwrap();
        let sym = Symbol::new(
            id,
            pid(),
            "cpp",
            "S",
            "A::B::S",
            SymbolKind::Struct,
            "a.cpp",
            Range::point(1, 0),
        )
        .unwrap();

        assert!(sym.clone().with_namespace(Some("A::B")).is_ok());
        assert!(sym.with_namespace(Some("X::Y")).is_err());
    }

    #[test]
    fn identity_key_uses_language_qualified_name_file_line() {
        let id = SymbolId::new(1).unwrap();
        let sym = Symbol::new(
            id,
            pid(),
            "cpp",
            "f",
            "A::f",
            SymbolKind::Function,
            "a.cpp",
            Range::point(3, 0),
        )
        .unwrap();
        assert_eq!(
            sym.identity_key(),
            ("cpp".to_string(), "A::f".to_string(), "a.cpp".to_string(), 3)
        );
    }

    #[test]
    fn confidence_is_clamped() {
        let id = SymbolId::new(1).unwrap();
        let sym = Symbol::new(
            id,
            pid(),
            "cpp",
            "f",
            "f",
            SymbolKind::Function,
            "a.cpp",
            Range::point(1, 0),
        )
        .unwrap()
        .with_confidence(5.0);
        assert_eq!(sym.confidence, 1.0);
    }
}
