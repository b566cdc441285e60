use crate::CliResult;
use arbor_core::error::Result;
use arbor_core::scanner::display_relative;
use arbor_core::session::UpdateOutcome;
use arbor_core::watcher::watch_session;
use arbor_runtime::Project;
use nu_ansi_term::Color;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub async fn run(project: Project, debounce_ms: u64) -> CliResult<()> {
    let session = project.session()?;

    info!("Initializing: Indexing project at: {}...", project.root.display());
    let report = session.index_directory(&project.root).await?;
    println!(
        "Indexed {} files ({} failed). Watching {} for changes, Ctrl+C to stop.",
        report.indexed,
        report.failed.len(),
        project.root.display()
    );

    let root = project.root.clone();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };
    watch_session(
        session,
        &project.root,
        Duration::from_millis(debounce_ms),
        shutdown,
        |path, outcome| print_change(&root, path, outcome),
    )
    .await?;

    info!("Watcher stopped.");
    Ok(())
}

fn print_change(root: &Path, path: &Path, outcome: &Result<UpdateOutcome>) {
    let shown = display_relative(path, root);
    match outcome {
        Ok(UpdateOutcome::Indexed(nodes)) => {
            println!("{} {} ({} nodes)", Color::Green.paint("indexed"), shown, nodes)
        }
        Ok(UpdateOutcome::Removed(_)) => println!("{} {}", Color::Yellow.paint("removed"), shown),
        Ok(UpdateOutcome::Unchanged) => {
            println!("{} {}", Color::DarkGray.paint("unchanged"), shown)
        }
        Ok(UpdateOutcome::Unsupported) => {}
        Err(e) => println!("{} {}: {}", Color::Red.paint("failed"), shown, e),
    }
}
