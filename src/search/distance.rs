//! Levenshtein distance with a ceiling.
//!
//! Callers only care whether two words are within a small number of edits,
//! so the computation gives up as soon as the answer is known to exceed the
//! ceiling:
//!
//! 1. `|len(a) - len(b)|` is a lower bound on the distance. If it exceeds the
//!    ceiling, return before allocating anything.
//! 2. Row minima never decrease from one DP row to the next. Once a row's
//!    minimum exceeds the ceiling, the final cell will too.
//!
//! Any distance above the ceiling is reported as `max_distance + 1`, which
//! keeps the function symmetric in its arguments.

/// Edit budget used when callers do not pick one.
pub const DEFAULT_MAX_DISTANCE: usize = 3;

/// Edit distance between `a` and `b`, or `max_distance + 1` if it is larger
/// than `max_distance`. Lengths are counted in chars.
#[must_use]
pub fn distance(a: &str, b: &str, max_distance: usize) -> usize {
    let over_budget = max_distance.saturating_add(1);

    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len.abs_diff(b_len) > max_distance {
        return over_budget;
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ac) in a.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for (j, &bc) in b_chars.iter().enumerate() {
            let cost = usize::from(ac != bc);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }

        if row_min > max_distance {
            return over_budget;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len].min(over_budget)
}
