//! Error types for the symbol-graph extraction pipeline.
//!
//! `IndexError` variants map 1:1 onto the abstract error kinds of spec §7
//! plus a handful of ambient I/O/config variants in the teacher's style
//! (`FileRead`, `ConfigError`, `General`). Every parse-time error is handled
//! within the driver's per-file boundary (§7 "Propagation policy") — nothing
//! above the driver ever observes one of these as a thrown exception.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {reason}")]
    ConfigError { reason: String },

    /// Grammar could not be loaded; the driver falls back globally.
    #[error("C++ grammar unavailable: {reason}")]
    GrammarUnavailable { reason: String },

    /// Per-file wall-clock budget exceeded; fallback retried once.
    #[error("Parse of '{path}' exceeded {timeout_ms}ms")]
    ParseTimeout { path: PathBuf, timeout_ms: u64 },

    /// The grammar or visitor threw; any partial AST-pass state is discarded.
    #[error("Parsing '{path}' threw: {reason}")]
    ParseThrew { path: PathBuf, reason: String },

    /// An invariant was violated while constructing a Symbol; the symbol is
    /// dropped and the file's parse continues.
    #[error("Invalid symbol: {reason}")]
    InvalidSymbol { reason: String },

    /// Multiple resolution candidates with no disambiguating context.
    #[error("Ambiguous resolution for '{reference}': {candidate_count} candidates")]
    ResolutionAmbiguous {
        reference: String,
        candidate_count: usize,
    },

    /// The resolution cache could not free space because every evictable
    /// entry is pinned by an in-flight parse.
    #[error("Resolution cache over capacity: {size}/{capacity}, all entries pinned")]
    OverCapacity { size: usize, capacity: usize },

    #[error("{0}")]
    General(String),
}

impl IndexError {
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::GrammarUnavailable { .. } => vec![
                "Parsing will continue using the deterministic fallback parser",
                "Check that the tree-sitter-cpp grammar version matches this build",
            ],
            Self::ParseTimeout { .. } => {
                vec!["The file will be retried once via the fallback parser"]
            }
            Self::OverCapacity { .. } => vec![
                "The driver will flush the currently-parsing file and retry",
                "Consider raising the resolution cache capacity in configuration",
            ],
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
            ],
            _ => vec![],
        }
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
