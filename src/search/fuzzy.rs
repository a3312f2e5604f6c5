//! Single-string fuzzy matching.
//!
//! Rules are tried in order and the first one that applies decides the score:
//!
//! | Rule                               | Score                     |
//! |------------------------------------|---------------------------|
//! | empty query                        | `1.0`                     |
//! | normalized text equals query       | `1.0 + exact_match_bonus` |
//! | normalized text starts with query  | `0.9 + prefix_match_bonus`|
//! | normalized text contains query     | `0.8`                     |
//! | word-level edit distance           | see [`word_match`]        |

use serde::{Deserialize, Serialize};

use crate::search::distance::{DEFAULT_MAX_DISTANCE, distance};
use crate::search::normalize::Normalizer;

const PREFIX_BASE_SCORE: f64 = 0.9;
const SUBSTRING_SCORE: f64 = 0.8;

/// Tuning knobs for [`fuzzy_match`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    /// Minimum per-word similarity for a query word to count.
    pub threshold: f64,
    pub exact_match_bonus: f64,
    pub prefix_match_bonus: f64,
    /// Edit budget per word pair.
    pub max_distance: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            exact_match_bonus: 0.2,
            prefix_match_bonus: 0.1,
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

/// Outcome of matching one query against one text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched: bool,
    pub score: f64,
}

impl MatchResult {
    const NONE: Self = Self {
        matched: false,
        score: 0.0,
    };

    fn hit(score: f64) -> Self {
        Self {
            matched: true,
            score,
        }
    }
}

/// Match `query` against `text`, normalizing both through `normalizer`.
pub fn fuzzy_match(
    normalizer: &mut Normalizer,
    query: &str,
    text: &str,
    options: &MatchOptions,
) -> MatchResult {
    if query.is_empty() {
        return MatchResult::hit(1.0);
    }

    let query = normalizer.normalize(query);
    let text = normalizer.normalize(text);

    if text == query {
        return MatchResult::hit(1.0 + options.exact_match_bonus);
    }
    if text.starts_with(&query) {
        return MatchResult::hit(PREFIX_BASE_SCORE + options.prefix_match_bonus);
    }
    if text.contains(query.as_str()) {
        return MatchResult::hit(SUBSTRING_SCORE);
    }

    word_match(&query, &text, options)
}

/// Word-by-word comparison of two normalized strings.
///
/// Each query word takes its best similarity against any text word. Words
/// whose best similarity exceeds the threshold add it to the total; the total
/// is then divided by the number of *all* query words, so a query that only
/// partly matches scores lower than one that fully matches.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn word_match(query: &str, text: &str, options: &MatchOptions) -> MatchResult {
    let query_words: Vec<&str> = query.split_whitespace().collect();
    if query_words.is_empty() {
        return MatchResult::NONE;
    }
    let text_words: Vec<&str> = text.split_whitespace().collect();

    let mut counted = 0usize;
    let mut total = 0.0;
    for query_word in &query_words {
        let best = text_words
            .iter()
            .map(|text_word| similarity(query_word, text_word, options.max_distance))
            .fold(0.0, f64::max);

        if best > options.threshold {
            counted += 1;
            total += best;
        }
    }

    MatchResult {
        matched: counted > 0,
        score: total / query_words.len() as f64,
    }
}

/// `1 - distance / longer length`, in `[0, 1]`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn similarity(a: &str, b: &str, max_distance: usize) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - distance(a, b, max_distance) as f64 / longest as f64
}
