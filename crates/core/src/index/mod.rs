//! Per-file roots plus a flat id lookup table over every materialized node.

use crate::error::{ArborError, Result};
use crate::model::{CodeNode, NodeId};
use crate::parser::ParsedFile;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub file_count: usize,
    pub node_count: usize,
}

/// Owns the materialized trees of all indexed files.
///
/// The node table always holds exactly the nodes reachable from the file roots:
/// every mutation evicts a file's previous tree completely before inserting a new
/// one.
#[derive(Default)]
pub struct StructureIndex {
    files: BTreeMap<Arc<Path>, Arc<CodeNode>>,
    nodes: HashMap<NodeId, Arc<CodeNode>>,
}

impl StructureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `parsed` and stores it. Indexing a path that is already present
    /// replaces its previous tree.
    pub fn index_file(&mut self, parsed: &ParsedFile) -> Result<usize> {
        self.insert_root(parsed.materialize())
    }

    /// Evicts the old tree of the file, then indexes the new one.
    pub fn update_file(&mut self, parsed: &ParsedFile) -> Result<usize> {
        self.remove_file(&parsed.path);
        self.index_file(parsed)
    }

    /// Stores an already materialized tree and returns the number of nodes added.
    ///
    /// On an id collision nothing of the new tree is kept and the file ends up
    /// absent from the index.
    pub fn insert_root(&mut self, root: Arc<CodeNode>) -> Result<usize> {
        if !root.is_root() {
            return Err(ArborError::Internal(format!(
                "{} is not a file root",
                root.id
            )));
        }

        let path = Arc::clone(&root.id.path);
        self.remove_file(&path);

        let mut inserted: Vec<NodeId> = Vec::new();
        let mut stack = vec![Arc::clone(&root)];
        while let Some(node) = stack.pop() {
            if self.nodes.contains_key(&node.id) {
                for id in &inserted {
                    self.nodes.remove(id);
                }
                tracing::error!("Id collision while indexing {}: {}", path.display(), node.id);
                return Err(ArborError::DuplicateNode(node.id.to_string()));
            }
            stack.extend(node.children.iter().cloned());
            inserted.push(node.id.clone());
            self.nodes.insert(node.id.clone(), node);
        }

        tracing::debug!("Indexed {} ({} nodes)", path.display(), inserted.len());
        self.files.insert(path, root);
        Ok(inserted.len())
    }

    /// Drops a file and all of its nodes. Returns how many nodes were evicted;
    /// zero when the file was not indexed.
    pub fn remove_file(&mut self, path: &Path) -> usize {
        let Some(root) = self.files.remove(path) else {
            return 0;
        };

        let mut evicted = 0;
        for node in root.descendants() {
            if self.nodes.remove(&node.id).is_some() {
                evicted += 1;
            }
        }
        tracing::debug!("Evicted {} ({} nodes)", path.display(), evicted);
        evicted
    }

    pub fn get_node_by_id(&self, id: &NodeId) -> Option<&Arc<CodeNode>> {
        self.nodes.get(id)
    }

    pub fn get_file_root(&self, path: &Path) -> Option<&Arc<CodeNode>> {
        self.files.get(path)
    }

    /// Resolves a node's parent link.
    pub fn parent_of(&self, node: &CodeNode) -> Option<&Arc<CodeNode>> {
        node.parent.as_ref().and_then(|id| self.nodes.get(id))
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// File roots in path order.
    pub fn roots(&self) -> impl Iterator<Item = &Arc<CodeNode>> {
        self.files.values()
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(|p| p.as_ref())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            file_count: self.file_count(),
            node_count: self.node_count(),
        }
    }

    /// Drops every file. Used when a session ends.
    pub fn clear(&mut self) {
        self.files.clear();
        self.nodes.clear();
    }

    /// True when the id table and the trees describe exactly the same node set.
    pub fn is_consistent(&self) -> bool {
        let mut reachable = HashSet::with_capacity(self.nodes.len());
        for root in self.files.values() {
            for node in root.descendants() {
                if !reachable.insert(&node.id) {
                    return false;
                }
                match self.nodes.get(&node.id) {
                    Some(stored) if std::ptr::eq(stored.as_ref(), node) => {}
                    _ => return false,
                }
            }
        }
        reachable.len() == self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeKind, Position, Range};
    use crate::testing::{materialize_js, parse_js};

    const ONE_FN: &str = "function add(a, b) {\n  return a + b;\n}\n";
    const TWO_FNS: &str =
        "function add(a, b) {\n  return a + b;\n}\n\nfunction sub(a, b) {\n  return a - b;\n}\n";

    fn ids_of(root: &CodeNode) -> HashSet<NodeId> {
        root.descendants().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn index_file_stores_every_node() {
        let mut index = StructureIndex::new();
        let parsed = parse_js("math.js", ONE_FN);
        let count = index.index_file(&parsed).unwrap();

        let root = index.get_file_root(Path::new("math.js")).unwrap();
        assert_eq!(count, root.descendants().count());
        assert_eq!(index.node_count(), count);
        for node in root.descendants() {
            assert!(index.get_node_by_id(&node.id).is_some());
        }
        assert!(index.is_consistent());
    }

    #[test]
    fn remove_twice_is_a_no_op() {
        let mut index = StructureIndex::new();
        index.index_file(&parse_js("math.js", ONE_FN)).unwrap();

        assert!(index.remove_file(Path::new("math.js")) > 0);
        assert_eq!(index.remove_file(Path::new("math.js")), 0);
        assert_eq!(index.remove_file(Path::new("never-indexed.js")), 0);
        assert_eq!(index.node_count(), 0);
        assert_eq!(index.file_count(), 0);
    }

    #[test]
    fn update_replaces_every_node() {
        let mut index = StructureIndex::new();
        index.index_file(&parse_js("math.js", ONE_FN)).unwrap();
        let old_root = Arc::clone(index.get_file_root(Path::new("math.js")).unwrap());
        let old_nodes: Vec<Arc<CodeNode>> = old_root
            .descendants()
            .filter_map(|n| index.get_node_by_id(&n.id).cloned())
            .collect();

        index.update_file(&parse_js("math.js", TWO_FNS)).unwrap();

        let new_root = index.get_file_root(Path::new("math.js")).unwrap();
        let functions = new_root
            .children
            .iter()
            .filter(|c| c.kind == NodeKind::FunctionDefinition)
            .count();
        assert_eq!(functions, 2);
        assert_eq!(index.node_count(), ids_of(new_root).len());

        // Ids that reappear at the same position must resolve to the new records.
        for old in &old_nodes {
            if let Some(current) = index.get_node_by_id(&old.id) {
                assert!(!Arc::ptr_eq(old, current), "stale node {}", old.id);
            }
        }
        assert!(index.is_consistent());
    }

    #[test]
    fn files_are_independent() {
        let mut index = StructureIndex::new();
        index.index_file(&parse_js("a.js", ONE_FN)).unwrap();
        index.index_file(&parse_js("b.js", TWO_FNS)).unwrap();
        let b_nodes = ids_of(index.get_file_root(Path::new("b.js")).unwrap()).len();

        index.remove_file(Path::new("a.js"));

        assert_eq!(index.file_count(), 1);
        assert_eq!(index.node_count(), b_nodes);
        assert!(index.is_consistent());
    }

    #[test]
    fn parent_links_resolve_through_the_table() {
        let mut index = StructureIndex::new();
        index.index_file(&parse_js("math.js", ONE_FN)).unwrap();
        let root = Arc::clone(index.get_file_root(Path::new("math.js")).unwrap());
        let function = &root.children[0];

        let parent = index.parent_of(function).unwrap();
        assert!(Arc::ptr_eq(parent, &root));
        assert!(index.parent_of(&root).is_none());
    }

    #[test]
    fn collision_leaves_the_file_absent() {
        let source: Arc<str> = Arc::from("aaaaaaaaaa");
        let path: Arc<Path> = Arc::from(Path::new("dup.js"));
        let root_id = NodeId::new(Arc::clone(&path), Position::new(0, 0), 0);
        let child_id = NodeId::new(Arc::clone(&path), Position::new(0, 1), 1);
        let child = || {
            Arc::new(CodeNode::new(
                child_id.clone(),
                NodeKind::Other,
                "identifier",
                None,
                Range::new(0, 1, 0, 2),
                1..2,
                Some(root_id.clone()),
                Vec::new(),
                Arc::clone(&source),
            ))
        };
        let root = Arc::new(CodeNode::new(
            root_id.clone(),
            NodeKind::Other,
            "program",
            None,
            Range::new(0, 0, 0, 10),
            0..10,
            None,
            vec![child(), child()],
            Arc::clone(&source),
        ));

        let mut index = StructureIndex::new();
        index.index_file(&parse_js("other.js", ONE_FN)).unwrap();
        let before = index.node_count();

        let err = index.insert_root(root).unwrap_err();
        assert!(matches!(err, ArborError::DuplicateNode(_)));
        assert!(!index.contains_file(&path));
        assert_eq!(index.node_count(), before);
        assert!(index.is_consistent());
    }

    #[test]
    fn non_root_is_rejected() {
        let root = materialize_js("math.js", ONE_FN);
        let function = Arc::clone(&root.children[0]);
        let mut index = StructureIndex::new();
        assert!(index.insert_root(function).is_err());
        assert_eq!(index.node_count(), 0);
    }
}
