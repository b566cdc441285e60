//! Definition digest: one listing line per named definition, grouped per file.
//!
//! The grammar's definition query labels the identifier of each construct
//! `name.definition.<kind>` and the whole construct `definition.<kind>`. Only the
//! line holding a name capture is printed, so a digest never dumps bodies.

use crate::config::DigestConfig;
use crate::error::{ArborError, Result};
use crate::parser::ParsedFile;
use crate::parser::utils::capture_label;
use crate::plugin::LanguageRegistry;
use crate::scanner::{Scanner, SourceSnapshot, display_relative};
use std::path::Path;
use std::time::{Duration, Instant};
use tree_sitter::{Query, QueryCursor, StreamingIterator, Tree};

pub const SEPARATOR: &str = "|----";
pub const LINE_MARKER: char = '│';
pub const NO_DEFINITIONS: &str = "No source code definitions found.";

/// One query capture reduced to what the digest needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub label: String,
    pub start_row: usize,
    pub end_row: usize,
}

impl Capture {
    pub fn new(label: impl Into<String>, start_row: usize, end_row: usize) -> Self {
        Self {
            label: label.into(),
            start_row,
            end_row,
        }
    }

    pub fn is_name(&self) -> bool {
        self.label.contains("name")
    }
}

pub fn collect_captures(query: &Query, tree: &Tree, source: &str) -> Vec<Capture> {
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source.as_bytes());

    let mut captures = Vec::new();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            let Some(label) = capture_label(query, capture.index) else {
                continue;
            };
            captures.push(Capture::new(
                label,
                capture.node.start_position().row,
                capture.node.end_position().row,
            ));
        }
    }
    captures
}

/// Renders the name lines of `captures` as one block.
///
/// A separator marks every jump of more than one line between consecutive printed
/// captures. Returns `None` when no name capture points at an existing line.
pub fn format_definitions(mut captures: Vec<Capture>, lines: &[&str]) -> Option<String> {
    captures.sort_by_key(|c| c.start_row);

    let mut body = String::new();
    let mut last_end: Option<usize> = None;
    let mut last_start: Option<usize> = None;
    for capture in captures.iter().filter(|c| c.is_name()) {
        // Two patterns naming the same line print it once.
        if last_start == Some(capture.start_row) {
            continue;
        }
        let Some(line) = lines.get(capture.start_row) else {
            continue;
        };
        if last_end.is_some_and(|end| end + 1 < capture.start_row) {
            body.push_str(SEPARATOR);
            body.push('\n');
        }
        body.push(LINE_MARKER);
        body.push_str(line);
        body.push('\n');
        last_end = Some(capture.end_row);
        last_start = Some(capture.start_row);
    }

    if body.is_empty() {
        None
    } else {
        Some(format!("{SEPARATOR}\n{body}{SEPARATOR}\n"))
    }
}

/// Digest of a single parsed file.
pub fn digest_parsed(parsed: &ParsedFile) -> Option<String> {
    let lines = parsed.lines();
    format_definitions(parsed.definition_captures(), &lines)
}

/// Builds definition digests for files and directories.
pub struct DefinitionLister<'r> {
    registry: &'r LanguageRegistry,
    config: DigestConfig,
}

enum FileOutcome {
    Block(String),
    Empty,
    Unsupported,
    Failed(String),
}

impl<'r> DefinitionLister<'r> {
    pub fn new(registry: &'r LanguageRegistry, config: DigestConfig) -> Self {
        Self { registry, config }
    }

    /// Digest of one file's source text, `None` when it has no named definitions.
    pub fn digest_source(&self, path: &Path, source: &str) -> Result<Option<String>> {
        let plugin = self
            .registry
            .for_path(path)
            .ok_or_else(|| ArborError::UnsupportedFileType(path.to_path_buf()))?;
        let parsed = ParsedFile::parse(path, source, plugin)?;
        Ok(digest_parsed(&parsed))
    }

    pub fn digest_file(&self, path: &Path) -> Result<Option<String>> {
        let snapshot = SourceSnapshot::read(path)?;
        self.digest_source(path, &snapshot.content)
    }

    /// Lists definitions of every file below `root`.
    ///
    /// Fails only when `root` itself cannot be read. Per-file problems are skipped,
    /// or reported as a line each in verbose mode.
    pub fn list_directory(&self, root: &Path) -> Result<String> {
        let started = Instant::now();
        let budget = Duration::from_millis(self.config.time_budget_ms);
        let paths = Scanner::collect_paths(root)?;

        let mut parts: Vec<String> = Vec::new();
        let mut found_any = false;
        let mut listed = 0usize;
        let mut remaining = paths.iter().filter(|p| self.wanted(p));

        while let Some(path) = remaining.next() {
            let shown = display_relative(path, root);
            if listed == self.config.max_files {
                let skipped = std::iter::once(path)
                    .chain(remaining)
                    .filter(|p| self.registry.supports_path(p))
                    .count();
                if skipped > 0 {
                    parts.push(format!("[{} more files not listed]\n", skipped));
                }
                break;
            }
            // At least one file is always listed, however small the budget.
            if listed > 0 && started.elapsed() >= budget {
                tracing::warn!(
                    "Definition listing of {} stopped after {} files",
                    root.display(),
                    listed
                );
                parts.push(format!(
                    "[listing stopped after {} files: time budget of {} ms exceeded]\n",
                    listed, self.config.time_budget_ms
                ));
                break;
            }

            match self.file_outcome(path) {
                FileOutcome::Block(block) => {
                    found_any = true;
                    listed += 1;
                    parts.push(format!("{shown}\n{block}"));
                }
                FileOutcome::Empty => listed += 1,
                FileOutcome::Unsupported => {
                    parts.push(format!("Unsupported file type: {shown}\n"));
                }
                FileOutcome::Failed(reason) => {
                    listed += 1;
                    tracing::warn!("Skipping {} in definition listing: {}", shown, reason);
                    if self.config.verbose {
                        parts.push(format!("Error parsing {shown}: {reason}\n"));
                    }
                }
            }
        }

        if !found_any {
            parts.push(format!("{NO_DEFINITIONS}\n"));
        }
        Ok(parts.join("\n"))
    }

    /// Supported files always; unsupported ones only to report them in verbose mode.
    fn wanted(&self, path: &Path) -> bool {
        self.config.verbose || self.registry.supports_path(path)
    }

    fn file_outcome(&self, path: &Path) -> FileOutcome {
        if !self.registry.supports_path(path) {
            return FileOutcome::Unsupported;
        }
        match self.digest_file(path) {
            Ok(Some(block)) => FileOutcome::Block(block),
            Ok(None) => FileOutcome::Empty,
            Err(e) => FileOutcome::Failed(e.to_string()),
        }
    }
}
