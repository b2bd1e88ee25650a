//! Fuzzy alias matching over a registry snapshot.
//!
//! Exact hits on the normalized key short-circuit at the stored confidence.
//! Otherwise candidates are scored `similarity * stored confidence` and
//! filtered by the caller's threshold. The candidate scan is bounded by the
//! inverted token index so latency stays roughly flat as the registry
//! grows; queries sharing no token with any alias fall back to a full
//! in-scope scan.
//!
//! Ordering is fully deterministic: score, then curated confidence, then
//! the longer (more specific) canonical, then lexical order. Results never
//! depend on map iteration order.

use std::collections::BTreeSet;

use crate::alias::entry::{AliasEntry, Scope};
use crate::alias::registry::AliasRegistry;
use crate::text::{normalize_text, similarity, strip_trailing_punctuation};

/// One alias candidate with its combined score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredAlias<'a> {
    /// The matched entry.
    pub entry: &'a AliasEntry,

    /// Combined score in `[0.0, 1.0]`.
    pub score: f32,
}

impl AliasRegistry {
    /// Resolves free text against aliases of one scope.
    ///
    /// Returns candidates at or above `min_score`, best first; empty means
    /// unresolved for this scope.
    #[must_use]
    pub fn resolve(&self, text: &str, scope: Scope, min_score: f32) -> Vec<ScoredAlias<'_>> {
        let normalized = normalize_text(strip_trailing_punctuation(text));
        if normalized.is_empty() {
            return Vec::new();
        }

        // Exact key hit scores the stored confidence, nothing else runs.
        if let Some(&idx) = self.exact.get(&(scope, normalized.clone())) {
            let entry = &self.entries[idx];
            return vec![ScoredAlias {
                entry,
                score: entry.confidence.value(),
            }];
        }

        let mut candidate_ids: BTreeSet<usize> = BTreeSet::new();
        for token in normalized.split_whitespace() {
            if let Some(ids) = self.token_index.get(&(scope, token.to_string())) {
                candidate_ids.extend(ids);
            }
        }

        let mut hits: Vec<ScoredAlias<'_>> = if candidate_ids.is_empty() {
            // No shared token anywhere: single-token misspellings can still
            // clear the threshold on edit distance alone, so scan the scope.
            self.entries
                .iter()
                .filter(|entry| entry.scope == scope)
                .filter_map(|entry| score_entry(entry, &normalized, min_score))
                .collect()
        } else {
            candidate_ids
                .into_iter()
                .filter_map(|idx| score_entry(&self.entries[idx], &normalized, min_score))
                .collect()
        };

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.entry.confidence.cmp(&a.entry.confidence))
                .then_with(|| b.entry.canonical.len().cmp(&a.entry.canonical.len()))
                .then_with(|| a.entry.canonical.cmp(&b.entry.canonical))
                .then_with(|| a.entry.normalized_alias.cmp(&b.entry.normalized_alias))
        });
        hits
    }
}

fn score_entry<'a>(
    entry: &'a AliasEntry,
    normalized_query: &str,
    min_score: f32,
) -> Option<ScoredAlias<'a>> {
    let sim = similarity(normalized_query, &entry.normalized_alias);
    let score = sim * entry.confidence.value();
    (score >= min_score).then_some(ScoredAlias { entry, score })
}
