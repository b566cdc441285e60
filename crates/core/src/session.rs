//! Async owner of a [`StructureIndex`]: bulk indexing, incremental updates and
//! concurrent read access.

use crate::config::ArborConfig;
use crate::error::{ArborError, Result};
use crate::index::{IndexStats, StructureIndex};
use crate::model::{CodeNode, NodeId};
use crate::navigation;
use crate::parser::ParsedFile;
use crate::plugin::{LanguagePlugin, LanguageRegistry};
use crate::scanner::{Scanner, SourceSnapshot};
use crate::search::{SearchEngine, SearchHit};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, RwLock, Semaphore};
use tokio::task::JoinSet;

/// What a single-file update did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "nodes")]
pub enum UpdateOutcome {
    Indexed(usize),
    /// Same content hash as the indexed version.
    Unchanged,
    /// The file no longer exists and was evicted.
    Removed(usize),
    Unsupported,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a bulk indexing run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub indexed: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub unsupported: usize,
    pub failed: Vec<FailedFile>,
}

enum Prepared {
    Missing,
    Unchanged,
    Ready { root: Arc<CodeNode>, hash: u64 },
}

/// Cheap to clone; clones share the same index.
#[derive(Clone)]
pub struct IndexSession {
    registry: Arc<LanguageRegistry>,
    config: Arc<ArborConfig>,
    index: Arc<RwLock<StructureIndex>>,
    hashes: Arc<DashMap<PathBuf, u64>>,
    path_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
    in_flight: Arc<Semaphore>,
}

impl IndexSession {
    pub fn new(registry: LanguageRegistry, config: ArborConfig) -> Self {
        let permits = config.indexing.max_concurrency.max(1);
        Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
            index: Arc::new(RwLock::new(StructureIndex::new())),
            hashes: Arc::new(DashMap::new()),
            path_locks: Arc::new(DashMap::new()),
            in_flight: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ArborConfig {
        &self.config
    }

    /// Indexes every supported file below `root`, parsing up to
    /// `max_concurrency` files at a time.
    ///
    /// Only an unreadable `root` fails the run; per-file failures are collected in
    /// the report.
    pub async fn index_directory(&self, root: &Path) -> Result<IndexReport> {
        let walk_root = root.to_path_buf();
        let paths = tokio::task::spawn_blocking(move || Scanner::collect_paths(&walk_root))
            .await
            .map_err(|e| ArborError::Internal(e.to_string()))??;

        let mut report = IndexReport::default();
        let stale: Vec<PathBuf> = {
            let walked: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
            self.indexed_under(root)
                .await
                .into_iter()
                .filter(|path| !walked.contains(path.as_path()))
                .collect()
        };
        for path in stale {
            let evicted = self.remove_path(&path).await;
            tracing::debug!("{} disappeared ({} nodes evicted)", path.display(), evicted);
            report.removed += 1;
        }

        let mut tasks = JoinSet::new();
        for path in paths {
            if !self.registry.supports_path(&path) {
                report.unsupported += 1;
                continue;
            }
            let permit = self.acquire_in_flight().await?;
            let session = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = session.update_path(&path).await;
                (path, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (path, outcome) = joined.map_err(|e| ArborError::Internal(e.to_string()))?;
            match outcome {
                Ok(UpdateOutcome::Indexed(_)) => report.indexed += 1,
                Ok(UpdateOutcome::Unchanged) => report.unchanged += 1,
                Ok(UpdateOutcome::Removed(_)) => report.removed += 1,
                Ok(UpdateOutcome::Unsupported) => report.unsupported += 1,
                Err(e) => report.failed.push(FailedFile {
                    path,
                    reason: e.to_string(),
                }),
            }
        }
        report.failed.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            "Indexed {} under {} ({} unchanged, {} removed, {} failed)",
            report.indexed,
            root.display(),
            report.unchanged,
            report.removed,
            report.failed.len()
        );
        Ok(report)
    }

    /// Re-reads `path` and replaces its tree.
    ///
    /// Calls for the same path are queued. A file that fails to parse is evicted
    /// and the error returned, so the index never keeps a stale tree.
    pub async fn update_path(&self, path: &Path) -> Result<UpdateOutcome> {
        let Some(plugin) = self.registry.for_path(path) else {
            return Ok(UpdateOutcome::Unsupported);
        };

        let lock = self.path_lock(path);
        let outcome = {
            let _guard = lock.lock().await;
            self.update_locked(path, plugin).await
        };
        self.release_path_lock(path, lock);
        outcome
    }

    async fn update_locked(
        &self,
        path: &Path,
        plugin: Arc<dyn LanguagePlugin>,
    ) -> Result<UpdateOutcome> {
        // Hashes are recorded and dropped together with the tree, under the path lock.
        let previous = self.hashes.get(path).map(|entry| *entry.value());
        let skip_errors = self.config.indexing.skip_trees_with_errors;
        let owned = path.to_path_buf();
        let prepared = tokio::task::spawn_blocking(move || {
            prepare(&owned, plugin, previous, skip_errors)
        })
        .await
        .map_err(|e| ArborError::Internal(e.to_string()))?;

        match prepared {
            Ok(Prepared::Missing) => Ok(UpdateOutcome::Removed(self.evict(path).await)),
            Ok(Prepared::Unchanged) => {
                tracing::trace!("{} unchanged", path.display());
                Ok(UpdateOutcome::Unchanged)
            }
            Ok(Prepared::Ready { root, hash }) => {
                let inserted = self.index.write().await.insert_root(root);
                match inserted {
                    Ok(count) => {
                        self.hashes.insert(path.to_path_buf(), hash);
                        Ok(UpdateOutcome::Indexed(count))
                    }
                    Err(e) => {
                        self.hashes.remove(path);
                        Err(e)
                    }
                }
            }
            Err(e) => {
                let evicted = self.evict(path).await;
                tracing::warn!(
                    "Failed to index {} ({} stale nodes evicted): {}",
                    path.display(),
                    evicted,
                    e
                );
                Err(e)
            }
        }
    }

    /// Drops `path` from the index. Removing an unknown path is a no-op.
    pub async fn remove_path(&self, path: &Path) -> usize {
        let lock = self.path_lock(path);
        let evicted = {
            let _guard = lock.lock().await;
            self.evict(path).await
        };
        self.release_path_lock(path, lock);
        evicted
    }

    /// Evicts every indexed file at or below `prefix`, e.g. after a directory was
    /// moved away.
    pub async fn remove_under(&self, prefix: &Path) -> Vec<(PathBuf, usize)> {
        let mut removed = Vec::new();
        for path in self.indexed_under(prefix).await {
            let evicted = self.remove_path(&path).await;
            removed.push((path, evicted));
        }
        removed
    }

    async fn indexed_under(&self, prefix: &Path) -> Vec<PathBuf> {
        self.index
            .read()
            .await
            .files()
            .filter(|path| path.starts_with(prefix))
            .map(Path::to_path_buf)
            .collect()
    }

    pub async fn search(&self, query: &str) -> Vec<SearchHit> {
        let index = self.index.read().await;
        SearchEngine::new(&index, &self.config.search).search(query)
    }

    pub async fn node_at(&self, path: &Path, row: usize, column: usize) -> Option<Arc<CodeNode>> {
        let index = self.index.read().await;
        navigation::find_node_at_position(&index, path, row, column)
    }

    pub async fn enclosing_unit(
        &self,
        path: &Path,
        row: usize,
        column: usize,
    ) -> Option<Arc<CodeNode>> {
        let index = self.index.read().await;
        navigation::enclosing_unit(&index, path, row, column)
    }

    pub async fn node_by_id(&self, id: &NodeId) -> Option<Arc<CodeNode>> {
        self.index.read().await.get_node_by_id(id).cloned()
    }

    pub async fn file_root(&self, path: &Path) -> Option<Arc<CodeNode>> {
        self.index.read().await.get_file_root(path).cloned()
    }

    pub async fn stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    /// Read access for callers that run several queries against one snapshot.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, StructureIndex> {
        self.index.read().await
    }

    /// Releases every tree. The session stays usable and starts empty.
    pub async fn teardown(&self) {
        self.index.write().await.clear();
        self.hashes.clear();
        self.path_locks.clear();
        tracing::debug!("Index session torn down");
    }

    async fn evict(&self, path: &Path) -> usize {
        self.hashes.remove(path);
        self.index.write().await.remove_file(path)
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(
            self.path_locks
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }

    /// Drops the path's lock entry unless another caller still holds or awaits it.
    fn release_path_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        drop(lock);
        // Cloning happens under the shard lock, so the count cannot grow during the check.
        self.path_locks
            .remove_if(path, |_, entry| Arc::strong_count(entry) == 1);
    }

    async fn acquire_in_flight(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.in_flight)
            .acquire_owned()
            .await
            .map_err(|_| ArborError::Internal("indexing semaphore closed".to_string()))
    }
}

/// Reads, hashes, parses and materializes one file on the blocking pool.
fn prepare(
    path: &Path,
    plugin: Arc<dyn LanguagePlugin>,
    previous_hash: Option<u64>,
    skip_trees_with_errors: bool,
) -> Result<Prepared> {
    let snapshot = match SourceSnapshot::read(path) {
        Ok(snapshot) => snapshot,
        Err(ArborError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Prepared::Missing);
        }
        Err(e) => return Err(e),
    };
    if previous_hash == Some(snapshot.content_hash) {
        return Ok(Prepared::Unchanged);
    }

    let parsed = ParsedFile::parse(path, snapshot.content, plugin)?;
    if skip_trees_with_errors && parsed.has_errors() {
        return Err(ArborError::Parsing(format!(
            "{} contains syntax errors",
            path.display()
        )));
    }
    Ok(Prepared::Ready {
        root: parsed.materialize(),
        hash: snapshot.content_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexingConfig;
    use crate::testing::javascript_plugin;
    use std::fs;

    fn session_with(indexing: IndexingConfig) -> IndexSession {
        let mut registry = LanguageRegistry::new();
        registry.register(javascript_plugin());
        IndexSession::new(
            registry,
            ArborConfig {
                indexing,
                ..ArborConfig::default()
            },
        )
    }

    fn session() -> IndexSession {
        session_with(IndexingConfig::default())
    }

    #[tokio::test]
    async fn bulk_run_isolates_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "function a() {}\n").unwrap();
        fs::write(dir.path().join("b.js"), "function b() {}\n").unwrap();
        fs::write(dir.path().join("bad.js"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("README.md"), "# readme\n").unwrap();

        let session = session();
        let report = session.index_directory(dir.path()).await.unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.unsupported, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].path.ends_with("bad.js"));
        assert_eq!(session.stats().await.file_count, 2);
        assert!(session.read().await.is_consistent());
    }

    #[tokio::test]
    async fn unchanged_files_are_skipped_on_rerun() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "function a() {}\n").unwrap();
        let session = session();

        session.index_directory(dir.path()).await.unwrap();
        let rerun = session.index_directory(dir.path()).await.unwrap();
        assert_eq!(rerun.indexed, 0);
        assert_eq!(rerun.unchanged, 1);
    }

    #[tokio::test]
    async fn rerun_evicts_files_deleted_since_the_last_run() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.js"), "function alpha() {}\n").unwrap();
        fs::write(dir.path().join("b.js"), "function beta() {}\n").unwrap();
        let session = session();
        session.index_directory(dir.path()).await.unwrap();

        fs::remove_file(dir.path().join("b.js")).unwrap();
        let rerun = session.index_directory(dir.path()).await.unwrap();

        assert_eq!(rerun.removed, 1);
        assert_eq!(rerun.unchanged, 1);
        assert_eq!(session.stats().await.file_count, 1);
        assert!(session.file_root(&dir.path().join("b.js")).await.is_none());
        assert!(session.search("beta").await.is_empty());
        assert!(session.read().await.is_consistent());
    }

    #[tokio::test]
    async fn rerun_leaves_files_outside_the_root_alone() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside.js");
        fs::write(&outside, "function keep() {}\n").unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/a.js"), "function a() {}\n").unwrap();

        let session = session();
        session.update_path(&outside).await.unwrap();
        let report = session.index_directory(&dir.path().join("sub")).await.unwrap();

        assert_eq!(report.removed, 0);
        assert!(session.file_root(&outside).await.is_some());
    }

    #[tokio::test]
    async fn directory_removal_evicts_every_file_below_it() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg/inner")).unwrap();
        fs::write(dir.path().join("pkg/a.js"), "function a() {}\n").unwrap();
        fs::write(dir.path().join("pkg/inner/b.js"), "function b() {}\n").unwrap();
        fs::write(dir.path().join("top.js"), "function top() {}\n").unwrap();
        let session = session();
        session.index_directory(dir.path()).await.unwrap();

        let removed = session.remove_under(&dir.path().join("pkg")).await;
        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|(_, nodes)| *nodes > 0));
        assert_eq!(session.stats().await.file_count, 1);
    }

    #[tokio::test]
    async fn path_locks_are_released_after_use() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            fs::write(
                dir.path().join(format!("{name}.js")),
                format!("function {name}() {{}}\n"),
            )
            .unwrap();
        }
        let session = session();
        session.index_directory(dir.path()).await.unwrap();
        session.update_path(&dir.path().join("a.js")).await.unwrap();
        session.remove_path(&dir.path().join("b.js")).await;

        assert!(session.path_locks.is_empty());
    }

    #[tokio::test]
    async fn failed_reindex_evicts_the_old_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        fs::write(&path, "function a() {}\n").unwrap();
        let session = session();
        session.update_path(&path).await.unwrap();
        assert!(session.file_root(&path).await.is_some());

        fs::write(&path, [0xff, 0xfe]).unwrap();
        assert!(session.update_path(&path).await.is_err());
        assert!(session.file_root(&path).await.is_none());
        assert_eq!(session.stats().await.node_count, 0);
    }

    #[tokio::test]
    async fn syntax_errors_fail_only_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.js");
        fs::write(&path, "function (\n").unwrap();

        let lenient = session();
        assert!(matches!(
            lenient.update_path(&path).await,
            Ok(UpdateOutcome::Indexed(_))
        ));

        let strict = session_with(IndexingConfig {
            skip_trees_with_errors: true,
            ..IndexingConfig::default()
        });
        assert!(strict.update_path(&path).await.is_err());
        assert!(strict.file_root(&path).await.is_none());
    }

    #[tokio::test]
    async fn unsupported_and_unknown_paths_are_harmless() {
        let session = session();
        assert_eq!(
            session.update_path(Path::new("notes.txt")).await.unwrap(),
            UpdateOutcome::Unsupported
        );
        assert_eq!(session.remove_path(Path::new("never.js")).await, 0);
        assert!(session.node_at(Path::new("never.js"), 0, 0).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_of_one_path_stay_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hot.js");
        fs::write(&path, "function a() {}\nfunction b() {}\n").unwrap();
        let session = session();

        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let session = session.clone();
            let path = path.clone();
            tasks.spawn(async move { session.update_path(&path).await });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let index = session.read().await;
        assert_eq!(index.file_count(), 1);
        assert!(index.is_consistent());
        assert!(session.path_locks.is_empty());
    }

    #[tokio::test]
    async fn queries_see_indexed_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("math.js");
        fs::write(&path, "function add(a, b) {\n  return a + b;\n}\n").unwrap();
        let session = session();
        session.update_path(&path).await.unwrap();

        let hits = session.search("add").await;
        assert_eq!(hits[0].node.name.as_deref(), Some("add"));

        let id = hits[0].node.id.clone();
        assert!(session.node_by_id(&id).await.is_some());
        let unit = session.enclosing_unit(&path, 1, 9).await.unwrap();
        assert_eq!(unit.id, id);

        session.teardown().await;
        assert!(session.node_by_id(&id).await.is_none());
        assert_eq!(session.stats().await.file_count, 0);
    }
}
