//! Parsing subsystem: the language-plugin seam (C10's per-language half,
//! `ParseInput`/`LanguageParser`/`LanguageRegistry`), shared AST utilities
//! (C1), and the concrete C++ implementation (C4-C9).

pub mod ast_utils;
pub mod cpp;
pub mod parser;
pub mod registry;

pub use parser::{LanguageParser, ParseInput};
pub use registry::{LanguageDefinition, LanguageRegistry};
