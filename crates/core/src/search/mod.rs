//! Lexical keyword search over indexed nodes.
//!
//! Ranking is a structural heuristic, not an IR model: the matched-term count is
//! boosted for named reusable units, reviewable sizes and name hits. There is no
//! stemming and no term weighting.

use crate::config::SearchConfig;
use crate::index::StructureIndex;
use crate::model::{CodeNode, NodeSummary};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::Arc;

/// Lowercased, whitespace-split query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub terms: Vec<String>,
    /// Terms joined by single spaces, matched verbatim in the phrase pass.
    pub phrase: String,
}

impl SearchQuery {
    pub fn parse(raw: &str) -> Self {
        let terms: Vec<String> = raw
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let phrase = terms.join(" ");
        Self { terms, phrase }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    fn is_multi_term(&self) -> bool {
        self.terms.len() > 1
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub node: Arc<CodeNode>,
    pub score: f64,
    pub matched_terms: Vec<String>,
}

impl SearchHit {
    pub fn summary(&self, preview_chars: usize) -> SearchHitView {
        SearchHitView {
            score: self.score,
            matched_terms: self.matched_terms.clone(),
            node: NodeSummary::from_node(&self.node, preview_chars),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHitView {
    pub score: f64,
    pub matched_terms: Vec<String>,
    pub node: NodeSummary,
}

pub struct SearchEngine<'a> {
    index: &'a StructureIndex,
    config: &'a SearchConfig,
}

impl<'a> SearchEngine<'a> {
    pub fn new(index: &'a StructureIndex, config: &'a SearchConfig) -> Self {
        Self { index, config }
    }

    /// Ranked hits for `raw_query`, best first. Equal scores keep scan order:
    /// phrase hits, then term hits, then compact declarations, each in file and
    /// pre-order.
    pub fn search(&self, raw_query: &str) -> Vec<SearchHit> {
        let query = SearchQuery::parse(raw_query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut phrase_hits = Vec::new();
        let mut term_hits = Vec::new();
        let mut short_declarations = Vec::new();

        for root in self.index.roots() {
            let lowered = LoweredSource::new(root.source());
            for node in self.candidates(root) {
                if !self.long_enough(node) {
                    if node.kind.is_compact_declaration() {
                        short_declarations.push(node);
                    }
                    continue;
                }

                let text = lowered.text_of(node);
                if query.is_multi_term() && text.contains(&query.phrase) {
                    phrase_hits.push(self.hit(node, query.terms.clone(), true));
                    continue;
                }

                let name = node.name.as_deref().map(str::to_lowercase);
                let matched: Vec<String> = query
                    .terms
                    .iter()
                    .filter(|term| {
                        text.contains(term.as_str())
                            || node.grammar_kind.contains(term.as_str())
                            || name.as_deref().is_some_and(|n| n.contains(term.as_str()))
                    })
                    .cloned()
                    .collect();
                if !matched.is_empty() {
                    term_hits.push(self.hit(node, matched, false));
                }
            }
        }

        let declaration_hits = short_declarations.into_iter().filter_map(|node| {
            let name = node.name.as_deref()?.to_lowercase();
            let matched: Vec<String> = query
                .terms
                .iter()
                .filter(|term| name.contains(term.as_str()))
                .cloned()
                .collect();
            (!matched.is_empty()).then(|| self.hit(node, matched, false))
        });

        let mut hits: Vec<SearchHit> = phrase_hits
            .into_iter()
            .chain(term_hits)
            .chain(declaration_hits)
            .collect();
        // `sort_by` is stable, so ties keep scan order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(limit) = self.config.max_results {
            hits.truncate(limit);
        }
        tracing::debug!("Query '{}' produced {} hits", query.phrase, hits.len());
        hits
    }

    /// Relevance of `node` given the terms it matched.
    pub fn score(&self, node: &CodeNode, matched_terms: &[String], exact_phrase: bool) -> f64 {
        let weights = &self.config.weights;
        let mut score = matched_terms.len() as f64;

        if node.kind.is_reusable_unit() {
            score *= weights.definition_kind;
        }

        let lines = node.range.line_count();
        if (self.config.moderate_min_lines..=self.config.moderate_max_lines).contains(&lines) {
            score *= weights.moderate_size;
        }

        if let Some(name) = &node.name {
            let name = name.to_lowercase();
            if matched_terms.iter().any(|term| name.contains(term.as_str())) {
                score *= weights.name_match;
            }
        }

        if exact_phrase {
            score *= weights.exact_phrase;
        }
        score
    }

    fn hit(&self, node: &CodeNode, matched_terms: Vec<String>, exact_phrase: bool) -> SearchHit {
        let score = self.score(node, &matched_terms, exact_phrase);
        let node = self
            .index
            .get_node_by_id(&node.id)
            .cloned()
            .unwrap_or_else(|| Arc::new(node.clone()));
        SearchHit {
            node,
            score,
            matched_terms,
        }
    }

    fn candidates(&self, root: &'a CodeNode) -> impl Iterator<Item = &'a CodeNode> + use<'a> {
        let include_roots = self.config.include_file_roots;
        root.descendants()
            .filter(move |node| include_roots || !node.is_root())
    }

    fn long_enough(&self, node: &CodeNode) -> bool {
        let min = self.config.min_text_len;
        // Byte length bounds the char count from above.
        node.byte_range.len() >= min && node.text().chars().take(min).count() == min
    }
}

/// A file's text lowercased once per query, sliced per node.
struct LoweredSource {
    text: String,
    /// Every char keeps its byte length when lowercased, so node byte ranges
    /// index `text` directly.
    aligned: bool,
}

impl LoweredSource {
    fn new(source: &str) -> Self {
        let text = source.to_lowercase();
        // Final sigma lowercases differently depending on what follows it.
        let aligned = text.len() == source.len()
            && !source.contains('Σ')
            && source.chars().all(|c| {
                c.is_ascii() || c.to_lowercase().map(char::len_utf8).sum::<usize>() == c.len_utf8()
            });
        Self { text, aligned }
    }

    fn text_of<'s>(&'s self, node: &CodeNode) -> Cow<'s, str> {
        if self.aligned {
            if let Some(slice) = self.text.get(node.byte_range.clone()) {
                return Cow::Borrowed(slice);
            }
        }
        Cow::Owned(node.text().to_lowercase())
    }
}
