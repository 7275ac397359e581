//! Primitive identifiers and value types shared across the symbol graph.
//!
//! These are the load-bearing newtypes the rest of the crate is built on:
//! `SymbolId` is non-zero so `Option<SymbolId>` is a single word, `Range` is
//! the universal source-position type, and `CompactString` is the small
//! boxed-string representation used for symbol names.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(NonZeroU32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(NonZeroU32);

macro_rules! nonzero_id {
    ($ty:ty) => {
        impl $ty {
            pub fn new(value: u32) -> Option<Self> {
                NonZeroU32::new(value).map(Self)
            }

            pub fn value(&self) -> u32 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0.get())
            }
        }
    };
}

nonzero_id!(SymbolId);
nonzero_id!(ProjectId);

/// 1-based line/column span, following tree-sitter's `start_position`/`end_position`
/// convention shifted by one (spec mandates 1-based positions for AST Utilities).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A zero-width range at a single point, used when only a definition line is known.
    pub fn point(line: u32, column: u16) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn contains(&self, line: u32, column: u16) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }
        if line == self.start_line && column < self.start_column {
            return false;
        }
        if line == self.end_line && column > self.end_column {
            return false;
        }
        true
    }
}

/// Universal symbol kinds (spec §3: Symbol.kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Namespace,
    Class,
    Struct,
    Function,
    Method,
    Constructor,
    Destructor,
    Field,
    Variable,
    Parameter,
    Enum,
    Typedef,
    Lambda,
    Module,
}

impl SymbolKind {
    /// Field symbols must be parented by one of these (spec §3 invariant).
    pub fn can_parent_field(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Struct)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
}

pub type CompactString = Box<str>;

pub fn compact_string(s: impl AsRef<str>) -> CompactString {
    s.as_ref().into()
}

/// Monotonically increasing in-process clock used by the resolution cache for
/// LRU ordering. Not wall-clock: the spec requires only relative recency
/// ("ordered by the file that produced them, not by absolute time").
#[derive(Debug, Default)]
pub struct LogicalClock(std::sync::atomic::AtomicU64);

impl LogicalClock {
    pub fn new() -> Self {
        Self(std::sync::atomic::AtomicU64::new(0))
    }

    pub fn tick(&self) -> u64 {
        self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_rejects_zero() {
        assert!(SymbolId::new(0).is_none());
        assert_eq!(SymbolId::new(7).unwrap().value(), 7);
    }

    #[test]
    fn range_contains_respects_columns_on_edge_lines() {
        let r = Range::new(10, 5, 10, 20);
        assert!(r.contains(10, 5));
        assert!(r.contains(10, 20));
        assert!(!r.contains(10, 4));
        assert!(!r.contains(10, 21));
        assert!(!r.contains(9, 10));
    }

    #[test]
    fn field_parent_kinds() {
        assert!(SymbolKind::Class.can_parent_field());
        assert!(SymbolKind::Struct.can_parent_field());
        assert!(!SymbolKind::Namespace.can_parent_field());
    }

    #[test]
    fn logical_clock_is_monotonic() {
        let clock = LogicalClock::new();
        let a = clock.tick();
        let b = clock.tick();
        assert!(b > a);
    }
}
