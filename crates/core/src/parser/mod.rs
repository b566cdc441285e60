//! Thin front-end over tree-sitter: one fresh parser per call, results bundled with
//! the shared source buffer so materialized nodes can borrow their text from it.

pub mod utils;

use crate::digest::{Capture, collect_captures};
use crate::error::{ArborError, Result};
use crate::materialize::materialize;
use crate::model::CodeNode;
use crate::plugin::LanguagePlugin;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::{Language, Parser, Tree};

pub fn parse_source(language: &Language, source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| ArborError::LanguageInit(e.to_string()))?;

    parser
        .parse(source, None)
        .ok_or_else(|| ArborError::Parsing("parser produced no tree".to_string()))
}

/// A source file together with its syntax tree and the grammar that produced it.
pub struct ParsedFile {
    pub path: Arc<Path>,
    pub source: Arc<str>,
    pub tree: Tree,
    pub plugin: Arc<dyn LanguagePlugin>,
}

impl ParsedFile {
    pub fn parse(
        path: impl AsRef<Path>,
        source: impl Into<Arc<str>>,
        plugin: Arc<dyn LanguagePlugin>,
    ) -> Result<Self> {
        let source: Arc<str> = source.into();
        let tree = parse_source(plugin.language(), &source)?;
        Ok(Self {
            path: Arc::from(path.as_ref()),
            source,
            tree,
            plugin,
        })
    }

    /// Whether the grammar had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    pub fn lines(&self) -> Vec<&str> {
        self.source.lines().collect()
    }

    pub fn materialize(&self) -> Arc<CodeNode> {
        materialize(
            self.tree.root_node(),
            Arc::clone(&self.source),
            Arc::clone(&self.path),
            self.plugin.as_ref(),
        )
    }

    /// Runs the grammar's definition query over the tree.
    pub fn definition_captures(&self) -> Vec<Capture> {
        collect_captures(self.plugin.definition_query(), &self.tree, &self.source)
    }
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("path", &self.path)
            .field("language", &self.plugin.name())
            .field("bytes", &self.source.len())
            .finish()
    }
}
