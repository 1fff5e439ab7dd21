//! Coherence (K) and recursion pressure (R) heuristics.
//!
//! The only cross-turn input is the previous turn's token set, which the
//! caller owns and passes in explicitly.

use crate::core::clamp01;
use std::collections::BTreeSet;

const SELF_REFERENCE_MARKERS: [&str; 3] = ["again", "repeat", "as i said"];
const MIN_REPEAT_RUN: usize = 3;

/// Lower-cased, whitespace-separated token set of a turn.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// True when the same word appears at least three times in a row,
/// separated only by whitespace.
///
/// Words are maximal runs of alphanumerics and underscores, compared as
/// given; callers lower-case first for case-insensitive matching.
pub fn has_repeated_run(text: &str) -> bool {
    let mut previous: Option<&str> = None;
    let mut run = 0usize;
    let mut rest = text;

    while let Some(start) = rest.find(is_word_char) {
        let gap = &rest[..start];
        let word_len = rest[start..]
            .find(|c: char| !is_word_char(c))
            .unwrap_or(rest.len() - start);
        let word = &rest[start..start + word_len];

        let gap_is_whitespace = !gap.is_empty() && gap.chars().all(char::is_whitespace);
        run = match previous {
            Some(prev) if prev == word && gap_is_whitespace => run + 1,
            _ => 1,
        };
        if run >= MIN_REPEAT_RUN {
            return true;
        }

        previous = Some(word);
        rest = &rest[start + word_len..];
    }
    false
}

/// Coherence of a turn in `[0, 1]`.
///
/// Reads the previous turn's tokens from `previous_tokens` and replaces them
/// with this turn's tokens. Blank text scores `0.0` and leaves the carried
/// tokens untouched.
///
/// # Example
///
/// ```rust
/// use mindgate::signals::estimate_coherence;
/// use std::collections::BTreeSet;
///
/// let mut carried = BTreeSet::new();
/// assert_eq!(estimate_coherence("", &mut carried), 0.0);
/// // closure 1.0, short text: 0.6 * 1.0
/// let k = estimate_coherence("All settled.", &mut carried);
/// assert!((k - 0.6).abs() < 1e-12);
/// assert!(carried.contains("settled."));
/// ```
pub fn estimate_coherence(text: &str, previous_tokens: &mut BTreeSet<String>) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let closure = if trimmed.ends_with(&['.', '!', '?'][..]) {
        1.0
    } else {
        0.5
    };
    let length_factor = clamp01((text.chars().count() as f64 - 80.0) / 400.0);

    let tokens = tokenize(text);
    let overlap = tokens.intersection(previous_tokens).count();
    *previous_tokens = tokens;

    let soft_penalty = clamp01(overlap as f64 / 20.0) * 0.15;
    let hard_penalty = if has_repeated_run(&text.to_lowercase()) {
        0.2
    } else {
        0.0
    };
    // Summed before subtracting; K feeds the trace hash bit for bit.
    let repeat_penalty = soft_penalty + hard_penalty;

    clamp01(0.6 * closure + 0.4 * length_factor - repeat_penalty)
}

/// Recursion pressure of a turn in `[0, 1]`.
///
/// # Example
///
/// ```rust
/// use mindgate::signals::estimate_recursion;
///
/// assert_eq!(estimate_recursion("a calm sentence"), 0.0);
/// assert!((estimate_recursion("no no no, again") - 0.7).abs() < 1e-12);
/// ```
pub fn estimate_recursion(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let repeats = if has_repeated_run(&lowered) { 1.0 } else { 0.0 };
    let self_ref: usize = SELF_REFERENCE_MARKERS
        .iter()
        .map(|marker| lowered.matches(*marker).count())
        .sum();
    clamp01(0.6 * repeats + 0.1 * self_ref as f64)
}
