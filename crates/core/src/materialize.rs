//! Conversion of a transient tree-sitter tree into owned [`CodeNode`] records.

use crate::model::{CodeNode, NodeId, NodeKind, Range};
use crate::plugin::LanguagePlugin;
use std::path::Path;
use std::sync::Arc;
use tree_sitter::Node;

/// Builds the owned tree rooted at `root`.
///
/// Only named nodes are kept. Comments and zero-width nodes inserted by error
/// recovery are dropped together with their subtrees.
pub fn materialize(
    root: Node<'_>,
    source: Arc<str>,
    path: Arc<Path>,
    plugin: &dyn LanguagePlugin,
) -> Arc<CodeNode> {
    let materializer = Materializer {
        source,
        path,
        plugin,
    };
    materializer.convert(root, None, 0)
}

struct Materializer<'p> {
    source: Arc<str>,
    path: Arc<Path>,
    plugin: &'p dyn LanguagePlugin,
}

impl Materializer<'_> {
    fn convert(&self, node: Node<'_>, parent: Option<&NodeId>, depth: u32) -> Arc<CodeNode> {
        let range = Range::from(node.range());
        let id = NodeId::new(Arc::clone(&self.path), range.start(), depth);
        let kind = self.plugin.classify(node.kind());
        let name = if kind.is_definition_like() {
            self.extract_name(node)
        } else {
            None
        };

        let mut cursor = node.walk();
        let children = node
            .named_children(&mut cursor)
            .filter(|child| self.keeps(child))
            .map(|child| self.convert(child, Some(&id), depth + 1))
            .collect();

        Arc::new(CodeNode::new(
            id,
            kind,
            node.kind(),
            name,
            range,
            node.byte_range(),
            parent.cloned(),
            children,
            Arc::clone(&self.source),
        ))
    }

    fn keeps(&self, node: &Node<'_>) -> bool {
        !node.is_missing()
            && node.end_byte() > node.start_byte()
            && self.plugin.classify(node.kind()) != NodeKind::Comment
    }

    /// The `name` field when the grammar exposes one, otherwise the first direct
    /// child that is a property or type identifier.
    fn extract_name(&self, node: Node<'_>) -> Option<String> {
        if let Some(name) = node.child_by_field_name("name") {
            return self.text_of(name);
        }

        let mut cursor = node.walk();
        let fallback = node.children(&mut cursor).find(|child| {
            matches!(
                self.plugin.classify(child.kind()),
                NodeKind::PropertyIdentifier | NodeKind::TypeIdentifier
            )
        });
        fallback.and_then(|child| self.text_of(child))
    }

    fn text_of(&self, node: Node<'_>) -> Option<String> {
        node.utf8_text(self.source.as_bytes())
            .ok()
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }
}
