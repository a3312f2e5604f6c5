//! Ranking a collection against a query.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::corpus::Candidate;
use crate::search::fuzzy::{MatchOptions, fuzzy_match};
use crate::search::normalize::Normalizer;

/// Default page size.
pub const DEFAULT_LIMIT: usize = 10;

/// Default minimum score for a candidate to be kept.
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// Which fields to search and which page of results to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RankOptions {
    /// Fields checked on every candidate; the best-scoring one counts.
    pub search_fields: Vec<String>,
    pub limit: usize,
    pub offset: usize,
    pub min_score: f64,
    pub matching: MatchOptions,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            search_fields: default_search_fields(),
            limit: DEFAULT_LIMIT,
            offset: 0,
            min_score: DEFAULT_MIN_SCORE,
            matching: MatchOptions::default(),
        }
    }
}

/// Fields searched when none are configured.
#[must_use]
pub fn default_search_fields() -> Vec<String> {
    ["name", "arabicName", "number"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// One page of ranked candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedResult {
    pub results: Vec<Candidate>,
    /// Score of each entry in `results`, in the same order.
    pub scores: Vec<f64>,
    /// Number of candidates that met the minimum score, before paging.
    pub total: usize,
    pub has_more: bool,
}

impl RankedResult {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            scores: Vec::new(),
            total: 0,
            has_more: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Candidates paired with their scores.
    pub fn iter(&self) -> impl Iterator<Item = (&Candidate, f64)> {
        self.results.iter().zip(self.scores.iter().copied())
    }

    fn page(scored: Vec<(f64, &Candidate)>, options: &RankOptions) -> Self {
        let total = scored.len();
        let (scores, results) = scored
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .map(|(score, candidate)| (score, candidate.clone()))
            .unzip();

        Self {
            results,
            scores,
            total,
            has_more: total > options.offset.saturating_add(options.limit),
        }
    }
}

/// Rank `candidates` against `query`.
///
/// An empty query returns the requested page in collection order. Otherwise
/// each candidate scores the best [`fuzzy_match`] over its search fields;
/// candidates under `min_score` are dropped and the rest are sorted by score,
/// highest first, keeping collection order among equal scores.
pub fn rank(
    normalizer: &mut Normalizer,
    query: &str,
    candidates: &[Candidate],
    options: &RankOptions,
) -> RankedResult {
    if query.is_empty() {
        let scored = candidates.iter().map(|c| (1.0, c)).collect();
        return RankedResult::page(scored, options);
    }

    let mut scored: Vec<(f64, &Candidate)> = candidates
        .iter()
        .map(|candidate| (best_field_score(normalizer, query, candidate, options), candidate))
        .filter(|(score, _)| *score >= options.min_score)
        .collect();

    // stable: ties keep collection order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    RankedResult::page(scored, options)
}

fn best_field_score(
    normalizer: &mut Normalizer,
    query: &str,
    candidate: &Candidate,
    options: &RankOptions,
) -> f64 {
    options
        .search_fields
        .iter()
        .filter_map(|field| candidate.field_text(field))
        .map(|text| fuzzy_match(normalizer, query, &text, &options.matching).score)
        .fold(0.0, f64::max)
}
