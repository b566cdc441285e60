use crate::view::HitRow;
use crate::{CliResult, print_json};
use arbor_core::scanner::display_relative;
use arbor_core::search::SearchHitView;
use arbor_runtime::Project;
use tabled::{Table, settings::Style};
use tracing::warn;

pub async fn run(
    mut project: Project,
    query: &str,
    limit: Option<usize>,
    json: bool,
) -> CliResult<()> {
    if limit.is_some() {
        project.config.search.max_results = limit;
    }
    let session = project.session()?;
    let report = session.index_directory(&project.root).await?;
    for failed in &report.failed {
        warn!(
            "Not searched: {}: {}",
            display_relative(&failed.path, &project.root),
            failed.reason
        );
    }

    let hits = session.search(query).await;
    let preview_chars = session.config().search.preview_chars;

    if json {
        let views: Vec<SearchHitView> = hits.iter().map(|h| h.summary(preview_chars)).collect();
        return print_json(&views);
    }
    if hits.is_empty() {
        println!("No matches for '{}'", query);
        return Ok(());
    }

    let rows: Vec<HitRow> = hits
        .iter()
        .map(|hit| HitRow::from_hit(hit, &project.root, preview_chars))
        .collect();
    println!("{}", Table::new(&rows).with(Style::psql()));
    Ok(())
}
