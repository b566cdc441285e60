use crate::{CliResult, print_json};
use arbor_core::index::IndexStats;
use arbor_core::scanner::display_relative;
use arbor_core::session::IndexReport;
use arbor_runtime::Project;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct IndexSummary<'a> {
    root: &'a Path,
    report: &'a IndexReport,
    stats: IndexStats,
}

pub async fn run(project: Project, json: bool) -> CliResult<()> {
    let session = project.session()?;
    info!("Indexing project at: {}...", project.root.display());

    let report = session.index_directory(&project.root).await?;
    let stats = session.stats().await;
    info!("Indexing complete!");

    if json {
        return print_json(&IndexSummary {
            root: &project.root,
            report: &report,
            stats,
        });
    }

    println!(
        "Indexed {} files ({} nodes) under {}",
        stats.file_count,
        stats.node_count,
        project.root.display()
    );
    println!(
        "  {} parsed, {} unchanged, {} unsupported, {} failed",
        report.indexed,
        report.unchanged,
        report.unsupported,
        report.failed.len()
    );
    for failed in &report.failed {
        println!(
            "  failed: {}: {}",
            display_relative(&failed.path, &project.root),
            failed.reason
        );
    }
    Ok(())
}
