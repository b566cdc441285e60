//! Bundled tree-sitter grammars for the structure index.

mod grammar;
pub mod queries;

pub use grammar::{Grammar, GrammarPlugin};

use arbor_core::error::Result;
use arbor_core::plugin::LanguageRegistry;
use std::sync::Arc;

/// Registry with every bundled grammar.
///
/// Fails when a grammar cannot be loaded, which the caller should treat as fatal.
pub fn default_registry() -> Result<LanguageRegistry> {
    registry_for(&Grammar::ALL)
}

pub fn registry_for(grammars: &[Grammar]) -> Result<LanguageRegistry> {
    let mut registry = LanguageRegistry::new();
    for &grammar in grammars {
        registry.register(Arc::new(GrammarPlugin::new(grammar)?));
    }
    Ok(registry)
}
