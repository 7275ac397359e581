//! `cxxgraph`: a C++ parsing and symbol-graph extraction library.
//!
//! [`driver::ParserDriver`] is the entry point most callers want — it ties
//! together the [`parsing::LanguageRegistry`], the shared
//! [`resolution::SymbolResolutionCache`], and a [`storage::PersistenceSink`]
//! (the in-memory [`storage::SymbolGraph`] ships as a reference
//! implementation). `cpp::CppParser` is the only concrete language plugin;
//! other languages are described by the schema but not parsed.

pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod parsing;
pub mod relationship;
pub mod resolution;
pub mod storage;
pub mod symbol;
pub mod types;
pub mod utils;

pub use config::{LoggingConfig, ParseOptions, ResolutionCacheConfig, Settings};
pub use driver::{FileJob, ParserDriver};
pub use error::{IndexError, IndexResult};
pub use parsing::cpp::CppParser;
pub use parsing::{LanguageDefinition, LanguageParser, LanguageRegistry, ParseInput};
pub use relationship::{RelationKind, Relationship, RelationshipContext};
pub use resolution::{CacheStatistics, ResolutionContext, SymbolResolutionCache};
pub use storage::{
    BlockType, CallEdge, CallType, ControlFlowBlock, FileIndex, ParseResult, ParseStats, Pattern,
    PatternSeverity, PersistenceSink, SymbolGraph,
};
pub use symbol::{Symbol, SymbolCounter};
pub use types::{
    compact_string, CompactString, LogicalClock, ProjectId, Range, SymbolId, SymbolKind,
    Visibility,
};
