use crate::error::{ArborError, Result};
use crate::plugin::LanguageRegistry;
use ignore::WalkBuilder;
use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::Xxh3;

/// Contents of one file as read from disk, with the hash used to skip unchanged files.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub path: PathBuf,
    pub content: String,
    pub content_hash: u64,
}

impl SourceSnapshot {
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let content_hash = Scanner::content_hash(&bytes);
        let content = String::from_utf8(bytes).map_err(|e| {
            ArborError::Parsing(format!("{} is not valid UTF-8: {}", path.display(), e))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            content,
            content_hash,
        })
    }
}

pub struct Scanner;

impl Scanner {
    /// Every regular file below `root` that survives `.gitignore` and hidden-file
    /// filtering, sorted by path.
    ///
    /// A missing or unreadable root is an error; unreadable entries below it are
    /// logged and skipped.
    pub fn collect_paths(root: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(root)?;
        if metadata.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut paths: Vec<PathBuf> = WalkBuilder::new(root)
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    let is_file = entry.file_type().is_some_and(|t| t.is_file());
                    is_file.then(|| entry.into_path())
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    None
                }
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Files below `root` that some registered grammar can parse.
    pub fn collect_sources(root: &Path, registry: &LanguageRegistry) -> Result<Vec<PathBuf>> {
        let mut paths = Self::collect_paths(root)?;
        paths.retain(|path| registry.supports_path(path));
        Ok(paths)
    }

    pub fn content_hash(bytes: &[u8]) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write(bytes);
        hasher.finish()
    }
}

/// `path` relative to `root` with forward slashes, for display.
pub fn display_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let shown = if relative.as_os_str().is_empty() {
        path.file_name().map(Path::new).unwrap_or(path)
    } else {
        relative
    };
    shown.to_string_lossy().replace('\\', "/")
}
