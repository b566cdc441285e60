//! JavaScript grammar wired up for unit tests.

use crate::model::CodeNode;
use crate::parser::ParsedFile;
use crate::parser::utils::load_query;
use crate::plugin::LanguagePlugin;
use std::sync::Arc;
use tree_sitter::{Language, Query};

const DEFINITIONS: &str = r#"
(class_declaration name: (identifier) @name.definition.class) @definition.class
(method_definition name: (property_identifier) @name.definition.method) @definition.method
(function_declaration name: (identifier) @name.definition.function) @definition.function
"#;

pub(crate) struct JavaScript {
    language: Language,
    query: Query,
}

impl LanguagePlugin for JavaScript {
    fn name(&self) -> &str {
        "javascript"
    }

    fn extensions(&self) -> &[&str] {
        &["js", "mjs"]
    }

    fn language(&self) -> &Language {
        &self.language
    }

    fn definition_query(&self) -> &Query {
        &self.query
    }
}

pub(crate) fn javascript_plugin() -> Arc<dyn LanguagePlugin> {
    let language: Language = tree_sitter_javascript::LANGUAGE.into();
    let query = load_query(&language, DEFINITIONS).expect("test query compiles");
    Arc::new(JavaScript { language, query })
}

pub(crate) fn parse_js(path: &str, source: &str) -> ParsedFile {
    ParsedFile::parse(path, source, javascript_plugin()).expect("javascript parses")
}

pub(crate) fn materialize_js(path: &str, source: &str) -> Arc<CodeNode> {
    parse_js(path, source).materialize()
}
