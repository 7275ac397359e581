//! The universal `Relationship` entity (spec §3).

use crate::symbol::SymbolId;
use crate::types::ProjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Calls,
    Inherits,
    Implements,
    Overrides,
    ReadsField,
    WritesField,
    Imports,
    Exports,
    References,
    Uses,
    Contains,
    MemberOf,
    Instantiates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipContext {
    pub line: u32,
    pub column: u16,
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub project_id: ProjectId,
    pub from_symbol_id: Option<SymbolId>,
    pub to_symbol_id: Option<SymbolId>,
    pub kind: RelationKind,
    /// In `[0, 1]`.
    pub confidence: f32,
    pub context: Option<RelationshipContext>,
    /// Opaque metadata. For unresolved relationships this carries the textual
    /// target name under the `"unresolved_target"` key (spec §3, §7).
    pub metadata: Option<serde_json::Value>,
}

impl Relationship {
    pub fn new(project_id: ProjectId, kind: RelationKind) -> Self {
        Self {
            project_id,
            from_symbol_id: None,
            to_symbol_id: None,
            kind,
            confidence: 1.0,
            context: None,
            metadata: None,
        }
    }

    pub fn from(mut self, id: SymbolId) -> Self {
        self.from_symbol_id = Some(id);
        self
    }

    pub fn to(mut self, id: SymbolId) -> Self {
        self.to_symbol_id = Some(id);
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn at(mut self, line: u32, column: u16) -> Self {
        self.context = Some(RelationshipContext {
            line,
            column,
            snippet: None,
        });
        self
    }

    /// Build an unresolved relationship: no `to_symbol_id`, textual target
    /// recorded in metadata for the post-pass sweep (spec §7).
    pub fn unresolved(mut self, target_name: impl Into<String>) -> Self {
        self.to_symbol_id = None;
        self.metadata = Some(serde_json::json!({ "unresolved_target": target_name.into() }));
        self
    }

    pub fn is_unresolved(&self) -> bool {
        self.to_symbol_id.is_none()
            && self
                .metadata
                .as_ref()
                .and_then(|m| m.get("unresolved_target"))
                .is_some()
    }

    pub fn unresolved_target(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("unresolved_target"))
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_roundtrip() {
        let pid = ProjectId::new(1).unwrap();
        let rel = Relationship::new(pid, RelationKind::Calls).unresolved("helper");
        assert!(rel.is_unresolved());
        assert_eq!(rel.unresolved_target(), Some("helper"));
    }

    #[test]
    fn resolved_is_not_unresolved() {
        let pid = ProjectId::new(1).unwrap();
        let rel = Relationship::new(pid, RelationKind::Calls).to(SymbolId::new(1).unwrap());
        assert!(!rel.is_unresolved());
    }
}
