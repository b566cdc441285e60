use crate::model::NodeKind;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::{Language, Query};

/// One grammar the index can read: a parser language, its compiled definition
/// query and the mapping from grammar node types to [`NodeKind`].
pub trait LanguagePlugin: Send + Sync {
    /// Display name, e.g. `typescript`.
    fn name(&self) -> &str;

    /// File extensions handled by this grammar, without the leading dot.
    fn extensions(&self) -> &[&str];

    fn language(&self) -> &Language;

    /// Query whose captures follow the `name.definition.<kind>` /
    /// `definition.<kind>` labelling convention.
    fn definition_query(&self) -> &Query;

    fn classify(&self, grammar_kind: &str) -> NodeKind {
        NodeKind::from_grammar(grammar_kind)
    }
}

/// Extension → grammar lookup owned by an indexing session.
#[derive(Clone, Default)]
pub struct LanguageRegistry {
    plugins: Vec<Arc<dyn LanguagePlugin>>,
    by_extension: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations win for extensions claimed twice.
    pub fn register(&mut self, plugin: Arc<dyn LanguagePlugin>) {
        let slot = self.plugins.len();
        for ext in plugin.extensions() {
            if let Some(previous) = self.by_extension.insert(ext.to_ascii_lowercase(), slot) {
                tracing::debug!(
                    "Extension '{}' moved from {} to {}",
                    ext,
                    self.plugins[previous].name(),
                    plugin.name()
                );
            }
        }
        self.plugins.push(plugin);
    }

    pub fn for_extension(&self, ext: &str) -> Option<Arc<dyn LanguagePlugin>> {
        self.by_extension
            .get(&ext.to_ascii_lowercase())
            .map(|&slot| Arc::clone(&self.plugins[slot]))
    }

    pub fn for_path(&self, path: &Path) -> Option<Arc<dyn LanguagePlugin>> {
        let ext = path.extension()?.to_str()?;
        self.for_extension(ext)
    }

    pub fn supports_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.by_extension.contains_key(&ext.to_ascii_lowercase()))
    }

    pub fn plugins(&self) -> &[Arc<dyn LanguagePlugin>] {
        &self.plugins
    }

    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_extension.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::javascript_plugin;

    #[test]
    fn lookup_by_path_is_case_insensitive() {
        let mut registry = LanguageRegistry::new();
        registry.register(javascript_plugin());

        assert!(registry.for_path(Path::new("src/app.js")).is_some());
        assert!(registry.for_path(Path::new("src/APP.JS")).is_some());
        assert!(registry.for_path(Path::new("README.md")).is_none());
        assert!(registry.for_path(Path::new("Makefile")).is_none());
        assert!(registry.supports_path(Path::new("a/b/c.mjs")));
    }

    #[test]
    fn empty_registry_supports_nothing() {
        let registry = LanguageRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.supports_path(Path::new("main.rs")));
        assert!(registry.extensions().is_empty());
    }
}
