use arbor_core::model::CodeNode;
use arbor_core::scanner::display_relative;
use arbor_core::search::SearchHit;
use std::path::Path;
use tabled::Tabled;

/// One search result as a table row.
#[derive(Tabled)]
pub struct HitRow {
    pub score: String,
    pub kind: String,
    pub name: String,
    pub location: String,
    pub preview: String,
}

impl HitRow {
    pub fn from_hit(hit: &SearchHit, root: &Path, preview_chars: usize) -> Self {
        let node = &hit.node;
        Self {
            score: format!("{:.2}", hit.score),
            kind: kind_label(node),
            name: node.name.clone().unwrap_or_else(|| "-".to_string()),
            location: location(node, root),
            preview: node.preview(preview_chars),
        }
    }
}

/// A node on the path from the cursor up to the file root.
#[derive(Tabled)]
pub struct NodeRow {
    pub depth: u32,
    pub kind: String,
    pub name: String,
    pub span: String,
    pub preview: String,
}

impl NodeRow {
    pub fn from_node(node: &CodeNode, preview_chars: usize) -> Self {
        let range = node.range;
        Self {
            depth: node.id.depth,
            kind: kind_label(node),
            name: node.name.clone().unwrap_or_else(|| "-".to_string()),
            span: format!(
                "{}:{}-{}:{}",
                range.start_row + 1,
                range.start_col + 1,
                range.end_row + 1,
                range.end_col + 1
            ),
            preview: node.preview(preview_chars),
        }
    }
}

/// Grammar node type, with the shared kind when it adds information.
fn kind_label(node: &CodeNode) -> String {
    match node.kind {
        arbor_core::model::NodeKind::Other => node.grammar_kind.to_string(),
        kind => format!("{} ({})", kind, node.grammar_kind),
    }
}

/// `relative/path:line:column`, 1-based.
pub fn location(node: &CodeNode, root: &Path) -> String {
    format!(
        "{}:{}:{}",
        display_relative(node.path(), root),
        node.range.start_row + 1,
        node.range.start_col + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::parser::ParsedFile;

    #[test]
    fn rows_use_one_based_project_relative_positions() {
        let registry = arbor_runtime::default_registry().unwrap();
        let path = Path::new("/p/src/a.rs");
        let plugin = registry.for_path(path).unwrap();
        let root = ParsedFile::parse(path, "fn a() {}\n", plugin)
            .unwrap()
            .materialize();

        let function = &root.children[0];
        assert_eq!(location(function, Path::new("/p")), "src/a.rs:1:1");

        let row = NodeRow::from_node(function, 40);
        assert_eq!(row.name, "a");
        assert_eq!(row.kind, "function (function_item)");
        assert_eq!(row.span, "1:1-1:10");
        assert_eq!(row.depth, 1);
    }
}
