//! Language registry (spec [AMBIENT] §4a).
//!
//! The universal schema is multi-language *shaped* even though only C++ has
//! a concrete parser in this build. Looking up an unregistered language id
//! is not a programmer error — Python/Go/TypeScript are "described
//! abstractly" per spec §1 — so it returns `IndexError::General` rather than
//! panicking.

use crate::error::IndexError;
use crate::parsing::parser::LanguageParser;
use std::collections::HashMap;
use std::sync::Arc;

/// Static metadata for a registrable language family (spec §3 `Language`
/// entity, minus the persistence-owned `id`/`enabled`/`priority` fields
/// that belong to the surrounding application, not the core).
pub struct LanguageDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub extensions: &'static [&'static str],
    pub parser: Arc<dyn LanguageParser>,
}

#[derive(Default)]
pub struct LanguageRegistry {
    by_id: HashMap<&'static str, LanguageDefinition>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: LanguageDefinition) {
        self.by_id.insert(definition.id, definition);
    }

    pub fn get(&self, language_id: &str) -> Result<&LanguageDefinition, IndexError> {
        self.by_id
            .get(language_id)
            .ok_or_else(|| IndexError::General(format!("language '{language_id}' not registered")))
    }

    pub fn language_for_extension(&self, extension: &str) -> Option<&LanguageDefinition> {
        self.by_id
            .values()
            .find(|def| def.extensions.contains(&extension))
    }

    pub fn is_registered(&self, language_id: &str) -> bool {
        self.by_id.contains_key(language_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::cpp::CppParser;

    fn registry() -> LanguageRegistry {
        let mut registry = LanguageRegistry::new();
        registry.register(LanguageDefinition {
            id: "cpp",
            display_name: "C++",
            extensions: &["cpp", "cc", "cxx", "hpp", "h"],
            parser: Arc::new(CppParser::new()),
        });
        registry
    }

    #[test]
    fn cpp_is_registered_by_extension_and_id() {
        let reg = registry();
        assert!(reg.is_registered("cpp"));
        assert!(reg.language_for_extension("cpp").is_some());
    }

    #[test]
    fn unregistered_language_is_a_general_error_not_a_panic() {
        let reg = registry();
        let err = reg.get("python");
        assert!(matches!(err, Err(IndexError::General(_))));
    }
}
