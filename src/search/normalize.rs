//! Text normalization so that case, diacritics and digit forms compare equal.

use std::time::Instant;

use unicode_normalization::UnicodeNormalization;

use crate::search::cache::BoundedCache;

/// Arabic-Indic digits. A digit maps to its position in this table.
const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Default number of memoized normalizations.
pub const DEFAULT_NORMALIZE_CAPACITY: usize = 100;

/// Canonicalize `text` for comparison.
///
/// In order: lowercase, canonical decomposition (NFD), drop combining
/// diacritical marks (U+0300..=U+036F), replace Arabic-Indic digits with
/// their ASCII digit, drop anything that is neither a word character nor
/// whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_diacritic(*c))
        .map(map_arabic_indic_digit)
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect()
}

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

fn map_arabic_indic_digit(c: char) -> char {
    ARABIC_INDIC_DIGITS
        .iter()
        .position(|&digit| digit == c)
        .and_then(|index| u32::try_from(index).ok())
        .and_then(|index| char::from_digit(index, 10))
        .unwrap_or(c)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Memoizing front end to [`normalize`].
///
/// Its cache has no TTL, so every lookup is stamped with the instant the
/// normalizer was built instead of reading the clock.
#[derive(Debug, Clone)]
pub struct Normalizer {
    cache: BoundedCache<String, String>,
    epoch: Instant,
}

impl Normalizer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NORMALIZE_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: BoundedCache::new(capacity),
            epoch: Instant::now(),
        }
    }

    /// Normalize `text`, reusing a previous result for the same input.
    pub fn normalize(&mut self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        if let Some(cached) = self.cache.get(text, self.epoch) {
            return cached.clone();
        }

        let normalized = normalize(text);
        self.cache.insert(text.to_owned(), normalized.clone(), self.epoch);
        normalized
    }

    /// Number of memoized inputs.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
