use super::{NodeKind, Position, Range};
use serde::Serialize;
use std::fmt;
use std::ops;
use std::path::Path;
use std::sync::Arc;

/// Stable key of a node inside the index.
///
/// The start position alone is not unique: a parent and its first child often start
/// at the same point (`program` and its first statement). Pairing it with the depth
/// in the materialized tree is, because siblings never overlap and zero-width nodes
/// are never materialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub path: Arc<Path>,
    pub start: Position,
    pub depth: u32,
}

impl NodeId {
    pub fn new(path: Arc<Path>, start: Position, depth: u32) -> Self {
        Self { path, start, depth }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}#{}",
            self.path.display(),
            self.start.row,
            self.start.column,
            self.depth
        )
    }
}

/// Owned record of one syntax node.
///
/// Children are owned by their parent. The parent link is only a key, resolved
/// through the index, so the tree has no ownership cycles.
#[derive(Debug, Clone)]
pub struct CodeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Raw node type reported by the grammar, e.g. `function_declaration`.
    pub grammar_kind: &'static str,
    pub name: Option<String>,
    pub range: Range,
    pub byte_range: ops::Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<Arc<CodeNode>>,
    source: Arc<str>,
}

impl CodeNode {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        grammar_kind: &'static str,
        name: Option<String>,
        range: Range,
        byte_range: ops::Range<usize>,
        parent: Option<NodeId>,
        children: Vec<Arc<CodeNode>>,
        source: Arc<str>,
    ) -> Self {
        Self {
            id,
            kind,
            grammar_kind,
            name,
            range,
            byte_range,
            parent,
            children,
            source,
        }
    }

    pub fn path(&self) -> &Path {
        &self.id.path
    }

    /// Exact source text spanned by the node.
    pub fn text(&self) -> &str {
        self.source.get(self.byte_range.clone()).unwrap_or_default()
    }

    /// The whole file this node was materialized from.
    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Pre-order walk over this node and all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Single-line rendering of the text: newlines become `⏎`, long text ends in `…`.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut out = String::with_capacity(max_chars.min(self.byte_range.len()) + 4);
        let mut chars = self.text().chars();
        for _ in 0..max_chars {
            match chars.next() {
                Some('\n') => out.push('⏎'),
                Some('\r') => {}
                Some(c) => out.push(c),
                None => return out,
            }
        }
        if chars.next().is_some() {
            out.push('…');
        }
        out
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a CodeNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a CodeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| child.as_ref()));
        Some(node)
    }
}

/// Serializable view of a node for hosts and the command line.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: String,
    pub path: String,
    pub kind: NodeKind,
    pub grammar_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub range: Range,
    pub preview: String,
}

impl NodeSummary {
    pub fn from_node(node: &CodeNode, preview_chars: usize) -> Self {
        Self {
            id: node.id.to_string(),
            path: node.path().display().to_string(),
            kind: node.kind,
            grammar_kind: node.grammar_kind.to_string(),
            name: node.name.clone(),
            range: node.range,
            preview: node.preview(preview_chars),
        }
    }
}
