//! Cursor position → node resolution.

use crate::index::StructureIndex;
use crate::model::CodeNode;
use std::path::Path;
use std::sync::Arc;

/// Deepest indexed node of `path` whose range contains `(row, column)`.
///
/// `None` when the file is not indexed or the position lies outside its root.
pub fn find_node_at_position(
    index: &StructureIndex,
    path: &Path,
    row: usize,
    column: usize,
) -> Option<Arc<CodeNode>> {
    let root = index.get_file_root(path)?;
    deepest_containing(root, row, column).cloned()
}

/// Descends from `root`, always into the first child that contains the position.
pub fn deepest_containing(root: &Arc<CodeNode>, row: usize, column: usize) -> Option<&Arc<CodeNode>> {
    if !root.range.contains(row, column) {
        return None;
    }

    let mut current = root;
    while let Some(child) = current
        .children
        .iter()
        .find(|child| child.range.contains(row, column))
    {
        current = child;
    }
    Some(current)
}

/// Nearest node at or above the position that is a function, method or class.
pub fn enclosing_unit(
    index: &StructureIndex,
    path: &Path,
    row: usize,
    column: usize,
) -> Option<Arc<CodeNode>> {
    let mut current = find_node_at_position(index, path, row, column)?;
    loop {
        if current.kind.is_reusable_unit() {
            return Some(current);
        }
        current = Arc::clone(index.parent_of(&current)?);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, NodeKind, Position, Range};
    use crate::testing::parse_js;

    fn synthetic_root() -> Arc<CodeNode> {
        let source: Arc<str> = Arc::from("x".repeat(200));
        let path: Arc<Path> = Arc::from(Path::new("synthetic.js"));
        let root_id = NodeId::new(Arc::clone(&path), Position::new(0, 0), 0);
        let child = Arc::new(CodeNode::new(
            NodeId::new(Arc::clone(&path), Position::new(2, 0), 1),
            NodeKind::FunctionDefinition,
            "function_declaration",
            Some("inner".to_string()),
            Range::new(2, 0, 4, 1),
            20..60,
            Some(root_id.clone()),
            Vec::new(),
            Arc::clone(&source),
        ));
        Arc::new(CodeNode::new(
            root_id,
            NodeKind::Other,
            "program",
            None,
            Range::new(0, 0, 10, 0),
            0..200,
            None,
            vec![child],
            source,
        ))
    }

    #[test]
    fn resolves_to_the_child_not_the_root() {
        let root = synthetic_root();
        let found = deepest_containing(&root, 3, 5).unwrap();
        assert_eq!(found.name.as_deref(), Some("inner"));

        let outside_child = deepest_containing(&root, 7, 0).unwrap();
        assert!(outside_child.is_root());
    }

    #[test]
    fn boundaries_are_inclusive() {
        let root = synthetic_root();
        assert_eq!(deepest_containing(&root, 2, 0).unwrap().id.depth, 1);
        assert_eq!(deepest_containing(&root, 4, 1).unwrap().id.depth, 1);
        assert_eq!(deepest_containing(&root, 4, 2).unwrap().id.depth, 0);
        assert!(deepest_containing(&root, 10, 1).is_none());
        assert!(deepest_containing(&root, 11, 0).is_none());
    }

    #[test]
    fn unknown_file_resolves_to_nothing() {
        let index = StructureIndex::new();
        assert!(find_node_at_position(&index, Path::new("missing.js"), 0, 0).is_none());
    }

    #[test]
    fn resolves_through_the_index() {
        let mut index = StructureIndex::new();
        let source = "function add(a, b) {\n  return a + b;\n}\n";
        index.index_file(&parse_js("math.js", source)).unwrap();

        // Cursor on the `a` in `a + b`.
        let node = find_node_at_position(&index, Path::new("math.js"), 1, 9).unwrap();
        assert_eq!(node.grammar_kind, "identifier");
        assert_eq!(node.text(), "a");

        let unit = enclosing_unit(&index, Path::new("math.js"), 1, 9).unwrap();
        assert_eq!(unit.name.as_deref(), Some("add"));

        assert!(find_node_at_position(&index, Path::new("math.js"), 9, 0).is_none());
    }
}
