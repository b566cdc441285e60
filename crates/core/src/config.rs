//! Tunables for search ranking, the definition listing and bulk indexing.
//!
//! Every section deserializes with defaults, so a config file only needs the keys
//! it changes:
//!
//! ```json
//! { "search": { "weights": { "name_match": 4.0 } }, "digest": { "max_files": 200 } }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Multiplicative boosts applied to the matched-term count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWeights {
    /// Function, method and class definitions.
    pub definition_kind: f64,
    /// Nodes spanning a reviewable number of lines.
    pub moderate_size: f64,
    /// A matched term also occurs in the node's name.
    pub name_match: f64,
    /// The whole multi-word query occurs verbatim in the text.
    pub exact_phrase: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            definition_kind: 2.0,
            moderate_size: 1.5,
            name_match: 3.0,
            exact_phrase: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Fragments shorter than this many characters are not candidates.
    pub min_text_len: usize,
    pub moderate_min_lines: usize,
    pub moderate_max_lines: usize,
    pub weights: SearchWeights,
    /// Whole-file roots match almost any query; they are skipped unless enabled.
    pub include_file_roots: bool,
    pub max_results: Option<usize>,
    pub preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_text_len: 10,
            moderate_min_lines: 3,
            moderate_max_lines: 30,
            weights: SearchWeights::default(),
            include_file_roots: false,
            max_results: None,
            preview_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Files listed per directory digest.
    pub max_files: usize,
    /// Wall-clock budget for one listing, in milliseconds.
    pub time_budget_ms: u64,
    /// Report unsupported and unparsable files instead of skipping them silently.
    pub verbose: bool,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_files: 50,
            time_budget_ms: 10_000,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    /// Files parsed at the same time during a bulk run.
    pub max_concurrency: usize,
    /// Treat trees with recovered syntax errors as parse failures.
    pub skip_trees_with_errors: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            skip_trees_with_errors: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArborConfig {
    pub search: SearchConfig,
    pub digest: DigestConfig,
    pub indexing: IndexingConfig,
}

impl ArborConfig {
    pub const FILE_NAME: &'static str = ".arbor.json";

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reads `<root>/.arbor.json` when present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self> {
        let candidate = root.join(Self::FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}
