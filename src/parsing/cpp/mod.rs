//! The C++ concrete language plugin (spec §4.1-§4.10): the only language
//! registered behind the [`crate::parsing::parser::LanguageParser`] seam.

pub mod complexity;
pub mod context;
pub mod control_flow;
pub mod fallback;
pub mod parser;
pub mod qualify;
pub mod relationships;
pub mod symbols;
pub mod visitor;

pub use parser::CppParser;
