use crate::view::{NodeRow, location};
use crate::{CliResult, print_json};
use arbor_core::error::ArborError;
use arbor_core::model::NodeSummary;
use arbor_core::session::UpdateOutcome;
use arbor_runtime::Project;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tabled::{Table, settings::Style};

#[derive(Serialize)]
struct CursorReport {
    node: NodeSummary,
    enclosing: Option<NodeSummary>,
    ancestors: Vec<NodeSummary>,
}

pub async fn run(
    project: Project,
    file: &Path,
    line: usize,
    column: usize,
    json: bool,
) -> CliResult<()> {
    let file = file.canonicalize()?;
    let session = project.session()?;
    if session.update_path(&file).await? == UpdateOutcome::Unsupported {
        return Err(ArborError::UnsupportedFileType(file).into());
    }

    let (row, col) = (line.saturating_sub(1), column.saturating_sub(1));
    let Some(node) = session.node_at(&file, row, col).await else {
        println!("No node at {}:{}:{}", file.display(), line, column);
        return Ok(());
    };

    let preview_chars = session.config().search.preview_chars;
    let chain = {
        let index = session.read().await;
        let mut chain = vec![Arc::clone(&node)];
        while let Some(parent) = chain.last().and_then(|n| index.parent_of(n)) {
            chain.push(Arc::clone(parent));
        }
        chain
    };

    if json {
        let enclosing = chain
            .iter()
            .find(|n| n.kind.is_reusable_unit())
            .map(|n| NodeSummary::from_node(n, preview_chars));
        return print_json(&CursorReport {
            node: NodeSummary::from_node(&node, preview_chars),
            enclosing,
            ancestors: chain[1..]
                .iter()
                .map(|n| NodeSummary::from_node(n, preview_chars))
                .collect(),
        });
    }

    println!("{}", location(&node, &project.root));
    let rows: Vec<NodeRow> = chain
        .iter()
        .map(|n| NodeRow::from_node(n, preview_chars))
        .collect();
    println!("{}", Table::new(&rows).with(Style::psql()));
    Ok(())
}
