//! Text normalization and fuzzy scoring used to locate a suggestion's target.

use std::collections::HashSet;

/// Minimum token overlap for a fuzzy match to be accepted.
pub const MATCH_THRESHOLD: f64 = 0.25;

fn is_edge_char(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '–' | '—')
}

/// Collapses whitespace runs to a single space, trims, strips leading and
/// trailing dash-like punctuation, and lowercases.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(is_edge_char)
        .to_lowercase()
}

/// Fraction of `b`'s whitespace tokens found in `a`, over the longer token count.
/// Returns 0.0 when either side is empty.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a_tokens: Vec<&str> = a.split_whitespace().collect();
    let b_tokens: Vec<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let a_set: HashSet<&str> = a_tokens.iter().copied().collect();
    let common = b_tokens.iter().filter(|t| a_set.contains(*t)).count();
    common as f64 / a_tokens.len().max(b_tokens.len()) as f64
}

/// True when both are non-empty and equal, or one contains the other.
pub fn loosely_equal(candidate: &str, target: &str) -> bool {
    if candidate.is_empty() || target.is_empty() {
        return false;
    }
    candidate == target || candidate.contains(target) || target.contains(candidate)
}
