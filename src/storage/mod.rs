pub mod graph;

pub use graph::{
    BlockType, CallEdge, CallType, ControlFlowBlock, FileIndex, ParseResult, ParseStats,
    Pattern, PatternSeverity, PersistenceSink, SymbolGraph,
};
