//! Filesystem watcher that feeds debounced changes into an [`IndexSession`].

use crate::error::Result;
use crate::plugin::LanguageRegistry;
use crate::scanner::Scanner;
use crate::session::{IndexSession, UpdateOutcome};
use notify::event::ModifyKind;
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher,
};
use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

pub struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    pub fn new(root: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Next event, `None` once the watcher is gone. Watcher errors are logged and skipped.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await? {
                Ok(event) => return Some(event),
                Err(e) => tracing::warn!("Watcher error: {}", e),
            }
        }
    }
}

/// Distinct paths touched by `events` that some grammar can parse.
pub fn relevant_paths(events: &[Event], registry: &LanguageRegistry) -> BTreeSet<PathBuf> {
    events
        .iter()
        .flat_map(|event| event.paths.iter())
        .filter(|path| registry.supports_path(path))
        .cloned()
        .collect()
}

/// Extensionless paths named by create, remove or rename events.
///
/// These are treated as directories: one that still exists is scanned for new
/// files, one that is gone takes the trees indexed below it along.
pub fn directory_changes(events: &[Event]) -> BTreeSet<PathBuf> {
    events
        .iter()
        .filter(|event| {
            matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
            )
        })
        .flat_map(|event| event.paths.iter())
        .filter(|path| path.extension().is_none())
        .cloned()
        .collect()
}

/// Applies [`directory_changes`]: evicts everything below vanished directories and
/// indexes the supported files of directories that appeared.
pub async fn apply_directory_changes(
    session: &IndexSession,
    dirs: impl IntoIterator<Item = PathBuf>,
) -> Vec<(PathBuf, Result<UpdateOutcome>)> {
    let mut results = Vec::new();
    for dir in dirs {
        if dir.is_dir() {
            match Scanner::collect_sources(&dir, session.registry()) {
                Ok(paths) => results.extend(apply_changes(session, paths).await),
                Err(e) => tracing::warn!("Cannot scan {}: {}", dir.display(), e),
            }
        } else {
            for (path, evicted) in session.remove_under(&dir).await {
                results.push((path, Ok(UpdateOutcome::Removed(evicted))));
            }
        }
    }
    results
}

/// Re-indexes each path in order. Deleted files are evicted by the update itself.
pub async fn apply_changes(
    session: &IndexSession,
    paths: impl IntoIterator<Item = PathBuf>,
) -> Vec<(PathBuf, Result<UpdateOutcome>)> {
    let mut results = Vec::new();
    for path in paths {
        let outcome = session.update_path(&path).await;
        if let Err(e) = &outcome {
            tracing::error!("Failed to update {}: {}", path.display(), e);
        }
        results.push((path, outcome));
    }
    results
}

/// Watches `root` until `shutdown` resolves, applying changes once no new event
/// has arrived for `debounce`. `on_change` sees every applied update.
pub async fn watch_session<S, F>(
    session: IndexSession,
    root: &Path,
    debounce: Duration,
    shutdown: S,
    mut on_change: F,
) -> Result<()>
where
    S: Future<Output = ()>,
    F: FnMut(&Path, &Result<UpdateOutcome>),
{
    let mut watcher = FsWatcher::new(root)?;
    tracing::info!("Started watching {}", root.display());

    tokio::pin!(shutdown);
    let mut pending: Vec<Event> = Vec::new();
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            event = watcher.next_event() => {
                match event {
                    Some(event) => pending.push(event),
                    None => break,
                }
            }
            _ = tokio::time::sleep(debounce), if !pending.is_empty() => {
                let paths = relevant_paths(&pending, session.registry());
                let dirs = directory_changes(&pending);
                pending.clear();
                if paths.is_empty() && dirs.is_empty() {
                    continue;
                }
                tracing::info!(
                    "Detected changes in {} files and {} directories. Updating...",
                    paths.len(),
                    dirs.len()
                );
                let mut results = apply_directory_changes(&session, dirs).await;
                results.extend(apply_changes(&session, paths).await);
                for (path, outcome) in &results {
                    on_change(path, outcome);
                }
            }
        }
    }

    tracing::info!("File watcher ended for {}", root.display());
    Ok(())
}
